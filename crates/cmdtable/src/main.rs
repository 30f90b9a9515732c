use std::process;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cmdtable::run(std::env::args().collect()).await {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {err}");
        }

        let code = err
            .downcast_ref::<cmdtable_core::Error>()
            .map_or(1, cmdtable_core::Error::exit_code);

        #[allow(clippy::exit)]
        process::exit(code);
    }
}
