mod config;
mod console;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    portfolio::{display_subtitle, items_per_row, project_badge},
    ui::{keys, StaticStrings, StringLookup},
    CmsGateway, ContactFormController, FormCollaborators, PortfolioState, RequestOptions,
    ResumeAction, ResumeDownloader, SubmitOutcome,
};
use shared::{normalize::Normalizer, protocol::ContactFields};
use storage::SqliteSessionStore;
use tracing_subscriber::EnvFilter;

use crate::{config::Settings, console::ConsoleUi};

#[derive(Parser, Debug)]
#[command(name = "portfolio", about = "Portfolio site CMS client")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the active projects as a JSON envelope.
    Projects,
    /// Print the active categories as a JSON envelope.
    Categories,
    /// Load projects and categories together and render the grid.
    Portfolio {
        #[arg(long)]
        category: Option<String>,
    },
    /// Resolve the résumé download link.
    Resume,
    Contact {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    ContactStatus,
    ContactReset,
    /// Forget everything stored for the current session.
    EndSession,
    /// Print a fresh session id to export as SESSION_ID.
    NewSession,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = config::load_settings();

    let gateway = CmsGateway::new(
        settings.cms_base_url.clone(),
        Normalizer::new(settings.media_host.clone()),
    );
    let options = RequestOptions::default();

    match args.command {
        Command::Projects => {
            let envelope = gateway.list_projects(&options).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Categories => {
            let envelope = gateway.list_categories(&options).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Portfolio { category } => {
            render_portfolio(gateway.load_portfolio(&options).await, category.as_deref())?;
        }
        Command::Resume => {
            let mut downloader = ResumeDownloader::new(settings.site_base_url.clone());
            downloader.load(&gateway, &options).await;
            let strings = StaticStrings::english();
            match downloader.click_with_feedback(&ConsoleUi::new(), &strings) {
                ResumeAction::Download(url) => {
                    println!("{}: {url}", strings.get(keys::DOWNLOAD_RESUME))
                }
                ResumeAction::Pending | ResumeAction::Missing => bail!("no résumé available"),
            }
        }
        Command::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let controller = contact_controller(&settings, gateway).await?;
            controller
                .set_fields(ContactFields::new(name, email, subject, message))
                .await;
            match controller.submit().await {
                SubmitOutcome::Submitted | SubmitOutcome::Ignored => {
                    print_success(&controller).await
                }
                SubmitOutcome::Rejected(_) => {
                    bail!(controller.error_message().await.unwrap_or_default())
                }
                SubmitOutcome::Failed(reason) => bail!("contact submission failed: {reason}"),
            }
        }
        Command::ContactStatus => {
            let controller = contact_controller(&settings, gateway).await?;
            println!("{}", controller.status().await.as_str());
            print_success(&controller).await;
        }
        Command::ContactReset => {
            let controller = contact_controller(&settings, gateway).await?;
            if controller.reset().await {
                println!("contact form reset");
            } else {
                println!("contact form was not submitted");
            }
        }
        Command::EndSession => {
            let store = open_store(&settings).await?;
            let removed = store.end_session().await?;
            println!("session '{}' cleared ({removed} entries)", store.session_id());
        }
        Command::NewSession => {
            println!("SESSION_ID={}", uuid::Uuid::new_v4());
        }
    }

    Ok(())
}

async fn open_store(settings: &Settings) -> Result<SqliteSessionStore> {
    SqliteSessionStore::new(&settings.session_database_url, settings.session_id.clone()).await
}

async fn contact_controller(
    settings: &Settings,
    gateway: CmsGateway,
) -> Result<ContactFormController> {
    let store = open_store(settings).await?;
    let ui = Arc::new(ConsoleUi::new());
    let deps = FormCollaborators {
        gateway: Arc::new(gateway),
        store: Arc::new(store),
        strings: Arc::new(StaticStrings::english()),
        busy: ui.clone(),
        notifier: ui.clone(),
        navigation: ui.clone(),
        host: ui,
    };
    Ok(ContactFormController::restore(settings.contact_form_options(), deps).await)
}

async fn print_success(controller: &ContactFormController) {
    if let Some(description) = controller.success_message().await {
        println!("{}", StaticStrings::english().get(keys::MESSAGE_SENT));
        println!("{description}");
    }
}

fn render_portfolio(state: PortfolioState, category: Option<&str>) -> Result<()> {
    let portfolio = match state {
        PortfolioState::Ready(portfolio) => portfolio,
        PortfolioState::Failed(error) => bail!(error),
        PortfolioState::Loading => return Ok(()),
    };

    let filters = portfolio.category_filters();
    if !filters.is_empty() {
        let labels: Vec<&str> = filters.iter().map(|filter| filter.label.as_str()).collect();
        println!("{}", labels.join(" | "));
    }

    let per_row = items_per_row(&ConsoleUi::new());
    for row in portfolio.filter_projects(category).chunks(per_row) {
        let cells: Vec<String> = row
            .iter()
            .map(|project| {
                format!(
                    "[{}] {} - {}",
                    project_badge(project).icon,
                    project.title,
                    display_subtitle(project)
                )
            })
            .collect();
        println!("{}", cells.join("    "));
    }
    Ok(())
}
