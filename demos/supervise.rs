use anyhow::Result;
use script_supervisor::server::StreamFilter;
use script_supervisor::{LogFilter, ScriptSupervisor, StartRequest, SupervisorConfig};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt}; // Import tracing subscriber components

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    // This configures how logs are collected and formatted.
    // `with_env_filter` reads the RUST_LOG environment variable to set the log level.
    // `with_target(true)` includes the module path in the log output.
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true) // Show module targets
        .init();

    tracing::info!("Starting supervise example");

    // Write a throwaway script to supervise
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("demo_server.sh");
    std::fs::write(
        &script,
        "echo \"booting\"\n\
         echo \"ready on port 3000\"\n\
         echo \"warning: demo mode\" >&2\n\
         exec sleep 30\n",
    )?;

    let config = SupervisorConfig {
        interpreter: "/bin/sh".to_string(),
        stop_timeout_ms: 2_000,
        ..SupervisorConfig::default()
    };
    let supervisor = ScriptSupervisor::new(config);

    // Launch the script
    let mut request = StartRequest::new(&script, dir.path());
    request.name = Some("demo".to_string());
    let started = supervisor.start_server(request).await?;
    println!("{}", started);

    // Give the stream readers a moment to pick up the first lines
    tokio::time::sleep(Duration::from_millis(300)).await;

    println!("\n--- Listing ---");
    println!("{}", supervisor.list_servers(true)?);

    println!("\n--- Detail ---");
    println!("{}", supervisor.server_detail(started.id, true)?);

    println!("\n--- Logs matching \"ready\" on stdout ---");
    let filter = LogFilter {
        streams: StreamFilter::StdoutOnly,
        contains: Some("ready".to_string()),
        ..LogFilter::default()
    };
    println!("{}", supervisor.server_logs(started.id, &filter)?);

    // Graceful stop; the script exits on SIGTERM so no escalation is needed
    let outcome = supervisor.stop_server(started.id, false).await?;
    println!("\n{}", outcome);

    supervisor.shutdown()?;
    Ok(())
}
