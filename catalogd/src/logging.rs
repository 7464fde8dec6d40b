//! `tracing` setup for the `catalogd` binary (SPEC_FULL.md §2): a global
//! `FmtSubscriber` built from `RUST_LOG`, with ANSI color disabled when
//! `NO_COLOR` is set, mirroring the teacher's `bindings::logging`
//! approach to installing a process-wide fallback subscriber.

pub fn install() {
    let ansi = std::env::var_os("NO_COLOR").is_none();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting global tracing subscriber");
}
