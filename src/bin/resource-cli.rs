use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, IF_MATCH};
use reqwest::Method;

#[derive(Parser)]
#[command(name = "resource-cli")]
#[command(about = "Client for the resource engine demo resources", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Media type to request.
    #[arg(short, long, default_value = "application/json")]
    accept: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every entry
    List,
    /// Fetch one entry
    Get { id: String },
    /// Create an entry from a JSON value
    Create { value: String },
    /// Create or replace an entry, optionally guarded by an ETag
    Put {
        id: String,
        value: String,
        #[arg(long)]
        if_match: Option<String>,
    },
    /// Delete an entry
    Delete { id: String },
    /// Replace a document's text
    Write { id: String, content: String },
    /// Replace `old` with `new` in a document
    Patch { id: String, old: String, new: String },
    /// Show the server clock
    Clock,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_str(&cli.accept)?);

    let (method, path, body, content_type) = match cli.command {
        Commands::List => (Method::GET, "/entries".to_string(), None, None),
        Commands::Get { id } => (Method::GET, format!("/entries/{id}"), None, None),
        Commands::Create { value } => (
            Method::POST,
            "/entries".to_string(),
            Some(value),
            Some("application/json"),
        ),
        Commands::Put { id, value, if_match } => {
            if let Some(etag) = if_match {
                headers.insert(IF_MATCH, HeaderValue::from_str(&etag)?);
            }
            (
                Method::PUT,
                format!("/entries/{id}"),
                Some(value),
                Some("application/json"),
            )
        }
        Commands::Delete { id } => (Method::DELETE, format!("/entries/{id}"), None, None),
        Commands::Write { id, content } => (
            Method::PUT,
            format!("/documents/{id}"),
            Some(content),
            Some("text/plain"),
        ),
        Commands::Patch { id, old, new } => (
            Method::PATCH,
            format!("/documents/{id}"),
            Some(format!("{old}|{new}")),
            Some("text/plain"),
        ),
        Commands::Clock => (Method::GET, "/clock".to_string(), None, None),
    };

    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    let mut request = client
        .request(method, format!("{}{}", cli.url, path))
        .headers(headers);
    if let Some(body) = body {
        request = request.body(body);
    }

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("{status}");
    for name in ["location", "etag", "last-modified", "allow"] {
        if let Some(value) = res.headers().get(name).and_then(|v| v.to_str().ok()) {
            println!("{name}: {value}");
        }
    }

    let is_json = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let text = res.text().await?;
    if text.is_empty() {
        return Ok(());
    }

    println!();
    if is_json {
        let json: serde_json::Value = serde_json::from_str(&text)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{text}");
    }

    if !status.is_success() && !status.is_redirection() {
        eprintln!("Error: server returned status {status}");
    }
    Ok(())
}
