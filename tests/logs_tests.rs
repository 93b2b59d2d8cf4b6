use script_supervisor::server::{LogBuffer, LogEntry, LogFilter, LogStream, StreamFilter};

fn stdout(content: &str) -> LogEntry {
    LogEntry::new(LogStream::Stdout, content)
}

fn stderr(content: &str) -> LogEntry {
    LogEntry::new(LogStream::Stderr, content)
}

#[test]
fn test_cap_is_never_exceeded_and_oldest_entries_go_first() {
    let cap = 5;
    let mut buffer = LogBuffer::new(cap);

    for i in 0..12 {
        buffer.append(stdout(&format!("line {}", i)));
        assert!(buffer.len() <= cap);
    }

    // The survivors are the most recent `cap` entries, in original order
    let view = buffer.query(&LogFilter::default());
    assert_eq!(view.total, cap);
    let contents: Vec<&str> = view.entries.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["line 7", "line 8", "line 9", "line 10", "line 11"]);
}

#[test]
fn test_stderr_substring_filter_matches_exactly_one_entry() {
    let mut buffer = LogBuffer::new(100);
    buffer.append(stdout("ok"));
    buffer.append(stderr("Error: bad"));
    buffer.append(stderr("fine"));

    let filter = LogFilter {
        limit: 10,
        streams: StreamFilter::StderrOnly,
        contains: Some("error".to_string()),
    };
    let view = buffer.query(&filter);

    assert_eq!(view.shown, 1);
    assert_eq!(view.total, 3);
    assert_eq!(view.entries[0].to_string(), "stderr: Error: bad");
}

#[test]
fn test_substring_match_is_case_insensitive() {
    let mut buffer = LogBuffer::new(100);
    buffer.append(stdout("FATAL ERROR in worker"));
    buffer.append(stdout("all good"));

    let filter = LogFilter {
        contains: Some("fatal error".to_string()),
        ..LogFilter::default()
    };
    assert_eq!(buffer.query(&filter).shown, 1);

    let filter = LogFilter {
        contains: Some("ALL GOOD".to_string()),
        ..LogFilter::default()
    };
    assert_eq!(buffer.query(&filter).shown, 1);
}

#[test]
fn test_limit_applies_after_filtering() {
    let mut buffer = LogBuffer::new(100);
    buffer.append(stderr("first failure"));
    buffer.append(stdout("noise"));
    buffer.append(stderr("second failure"));
    buffer.append(stdout("more noise"));
    buffer.append(stderr("third failure"));
    buffer.append(stdout("trailing noise"));

    // Filtering narrows to the three stderr entries; the limit then keeps
    // the most recent two of those, not two of the raw tail
    let filter = LogFilter {
        limit: 2,
        streams: StreamFilter::StderrOnly,
        contains: None,
    };
    let view = buffer.query(&filter);

    assert_eq!(view.shown, 2);
    let contents: Vec<&str> = view.entries.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["second failure", "third failure"]);
}

#[test]
fn test_empty_buffer_has_a_reason() {
    let buffer = LogBuffer::new(100);
    let view = buffer.query(&LogFilter::default());

    assert_eq!(view.shown, 0);
    assert_eq!(view.total, 0);
    assert_eq!(
        view.reason(),
        Some("no log output has been recorded for this server")
    );
}

#[test]
fn test_unmatched_filter_has_a_reason() {
    let mut buffer = LogBuffer::new(100);
    buffer.append(stdout("hello"));

    let filter = LogFilter {
        contains: Some("goodbye".to_string()),
        ..LogFilter::default()
    };
    let view = buffer.query(&filter);

    assert_eq!(view.shown, 0);
    assert_eq!(view.total, 1);
    assert_eq!(
        view.reason(),
        Some("no log entries match the requested filter")
    );

    // A non-empty result needs no explanation
    assert!(buffer.query(&LogFilter::default()).reason().is_none());
}

#[test]
fn test_view_display_shows_entries_and_counts() {
    let mut buffer = LogBuffer::new(100);
    buffer.append(stdout("listening"));
    buffer.append(stderr("Error: bind failed"));
    buffer.append(stdout("retrying"));

    let filter = LogFilter {
        streams: StreamFilter::StderrOnly,
        ..LogFilter::default()
    };
    let rendered = buffer.query(&filter).to_string();

    assert_eq!(
        rendered,
        "stderr: Error: bind failed\nShowing 1 of 3 log entries"
    );
}

#[test]
fn test_tail_returns_most_recent_entries_in_order() {
    let mut buffer = LogBuffer::new(100);
    for i in 0..6 {
        buffer.append(stdout(&format!("line {}", i)));
    }

    let tail = buffer.tail(2);
    let contents: Vec<&str> = tail.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["line 4", "line 5"]);

    // Asking for more than is buffered returns everything
    assert_eq!(buffer.tail(50).len(), 6);
}
