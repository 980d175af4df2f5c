use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, HOST, LOCATION};
use reqwest::redirect::Policy;
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "short-url-cli")]
#[command(about = "Management CLI for the short URL service", long_about = None)]
struct Cli {
    /// Base URL of the service.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Global or domain management key.
    #[arg(short, long)]
    key: String,

    /// Host header to send, selecting the domain for domain commands.
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Redirect target URL.
    target: String,
    /// Answer with 301 instead of 302.
    #[arg(long)]
    permanent: bool,
    /// Query merge policy: none, append-directly, append-removing-leading-question-mark.
    #[arg(long)]
    query: Option<String>,
}

impl TargetArgs {
    fn params(self) -> Vec<(&'static str, String)> {
        let mut params = vec![("target", self.target)];
        if self.permanent {
            params.push(("permanent", "1".to_string()));
        }
        if let Some(query) = self.query {
            params.push(("query", query));
        }
        params
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show service or domain status
    Status,
    /// List domains (global)
    ListDomains,
    /// Add a domain (global)
    AddDomain {
        domain: String,
        management_key: String,
        #[command(flatten)]
        default_target: TargetArgs,
    },
    /// Remove a domain (global)
    RemoveDomain { domain: String },
    /// Change a domain's management key (global)
    SetDomainKey { domain: String, management_key: String },
    /// List host aliases (global)
    ListAliases,
    /// Add a host alias (global)
    AddAlias { alias: String, target: String },
    /// Remove a host alias (global)
    RemoveAlias { alias: String },
    /// List hosts allowed to open global management (global)
    ListEnabledHosts,
    /// Allow a host to open global management (global)
    AddEnabledHost { host: String },
    /// Disallow a host from opening global management (global)
    RemoveEnabledHost {
        host: String,
        /// Allow removing the last host, which opens global management on every host.
        #[arg(long)]
        force: bool,
    },
    /// List redirect records (domain)
    ListRedirects,
    /// Add or replace a redirect record (domain)
    SetRedirect {
        access_key: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Remove a redirect record (domain)
    RemoveRedirect { access_key: String },
    /// Set the default target of the service (global key) or domain (domain key)
    SetDefault {
        #[command(flatten)]
        target: TargetArgs,
    },
}

impl Commands {
    fn into_request(self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            Commands::Status => ("status", vec![]),
            Commands::ListDomains => ("list-domains", vec![]),
            Commands::AddDomain {
                domain,
                management_key,
                default_target,
            } => {
                let mut params = vec![("domain", domain), ("key", management_key)];
                params.extend(default_target.params());
                ("add-domain", params)
            }
            Commands::RemoveDomain { domain } => ("remove-domain", vec![("domain", domain)]),
            Commands::SetDomainKey {
                domain,
                management_key,
            } => (
                "set-domain-key",
                vec![("domain", domain), ("key", management_key)],
            ),
            Commands::ListAliases => ("list-aliases", vec![]),
            Commands::AddAlias { alias, target } => {
                ("add-alias", vec![("alias", alias), ("target", target)])
            }
            Commands::RemoveAlias { alias } => ("remove-alias", vec![("alias", alias)]),
            Commands::ListEnabledHosts => ("list-enabled-hosts", vec![]),
            Commands::AddEnabledHost { host } => ("add-enabled-host", vec![("host", host)]),
            Commands::RemoveEnabledHost { host, force } => {
                let mut params = vec![("host", host)];
                if force {
                    params.push(("force", "1".to_string()));
                }
                ("remove-enabled-host", params)
            }
            Commands::ListRedirects => ("list-redirects", vec![]),
            Commands::SetRedirect { access_key, target } => {
                let mut params = vec![("key", access_key)];
                params.extend(target.params());
                ("set-redirect", params)
            }
            Commands::RemoveRedirect { access_key } => {
                ("remove-redirect", vec![("key", access_key)])
            }
            Commands::SetDefault { target } => ("set-default", target.params()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()?;

    let mut url = Url::parse(&cli.url)?;
    url.path_segments_mut()
        .map_err(|_| "service URL cannot be a base")?
        .clear()
        .push(&cli.key);

    let (operation, params) = cli.command.into_request();
    url.query_pairs_mut()
        .append_pair("operation", operation)
        .extend_pairs(params.iter().map(|(name, value)| (*name, value.as_str())));

    let mut headers = HeaderMap::new();
    if let Some(host) = &cli.host {
        headers.insert(HOST, HeaderValue::from_str(host)?);
    }

    let res = client.get(url).headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_redirection() {
        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?");
        eprintln!("Error: key was not accepted as a management key (redirected to {location})");
        return Ok(());
    }

    let is_json = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: management returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if is_json {
        let json: Value = serde_json::from_str(&text)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", text);
    }
    Ok(())
}
