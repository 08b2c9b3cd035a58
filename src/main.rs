use std::process::ExitCode;

use anyhow::Context;
use echovox::{
    Cli, Command, ConfigError, ConfigManager, DocumentService, FsArtifactStore, Output,
    StoreError, UploadArgs, telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        store_error.kind().exit_code()
    } else if error.downcast_ref::<ConfigError>().is_some() {
        ConfigError::EXIT_CODE
    } else {
        1
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigManager::load_config(&cli).await?;
    telemetry::init_tracing(&config.logging).context("Failed to initialize logging")?;

    let store = FsArtifactStore::init(&config.storage.directory).await?;
    let service = DocumentService::new(store);
    let output = Output::new(config.output.format.into());

    let rendered = match &cli.command {
        Command::Upload(args) => {
            let bytes = read_upload(args).await?;
            service.upload(&args.original_filename(), &bytes).await?;
            output.format_action("Uploaded", &args.original_filename())?
        }
        Command::Replace(args) => {
            let bytes = read_upload(args).await?;
            service.replace(&args.original_filename(), &bytes).await?;
            output.format_action("Replaced", &args.original_filename())?
        }
        Command::Delete { filename } => {
            service.delete(filename).await?;
            output.format_action("Deleted", filename)?
        }
        Command::Get { filename } => {
            let document = service.get_content(filename).await?;
            output.format_document(&document)?
        }
        Command::Search(args) => {
            let query = args
                .query()
                .context("One of --date, --customer or --type is required")?;
            let entries = service.search(&query).await?;
            output.format_entries(&entries)?
        }
    };

    println!("{}", rendered);
    Ok(())
}

async fn read_upload(args: &UploadArgs) -> echovox::Result<Vec<u8>> {
    tokio::fs::read(&args.path)
        .await
        .map_err(|e| StoreError::io(format!("Could not read {}", args.path.display()), e))
}
