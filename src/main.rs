use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-line-editor",
    version,
    about = "Review OCR line results from the annotation service"
)]
struct Cli {
    /// Annotation service base url (overrides settings [server] base_url)
    #[arg(short = 's', long = "server")]
    server: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Upload an image (PNG or JPEG), wait for recognition and review it
    #[arg(short = 'u', long = "upload")]
    upload: Option<String>,

    /// Review the lines of an already processed image/request id
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Line to focus after loading; the review starts after it
    #[arg(long = "focus-line", requires = "image")]
    focus_line: Option<String>,

    /// Ask the service to recompute aggregate scores of a document and exit
    #[arg(long = "scores")]
    scores: Option<String>,

    /// Show the processing status of a request and exit
    #[arg(long = "status")]
    status: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ocr_line_editor::logging::init(cli.verbose)?;

    let output = ocr_line_editor::run(ocr_line_editor::Config {
        server: cli.server,
        settings_path: cli.read_settings,
        upload: cli.upload,
        image: cli.image,
        focus_line: cli.focus_line,
        scores: cli.scores,
        status: cli.status,
        assume_yes: cli.yes,
    })
    .await?;

    println!("{}", output);
    Ok(())
}
