//! Exercise the client data layer against a running proxy and print what the pages would show.
//! Usage:
//!   cargo run --bin browse -- list <popular|top_rated|trending> [page]
//!   cargo run --bin browse -- search <text> [page]
//!   cargo run --bin browse -- detail <movie_id>
//! Requires PROXY_ENDPOINT and PROXY_CLIENT_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use cineflix::card::MovieCard;
use cineflix::client::{MovieQueries, ProxyClient, QueryState};
use cineflix::config::ClientConfig;
use cineflix::detail::{self, DetailView};
use cineflix::models::{Category, ListingKey};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_page(arg: Option<&String>) -> Result<u32> {
    arg.map(|p| p.parse::<u32>().context("page must be a positive integer"))
        .transpose()
        .map(|p| p.unwrap_or(1))
}

fn print_card(card: &MovieCard) {
    println!(
        "{:>8}  {:<50} {:>4}  ★ {}",
        card.id,
        card.title,
        card.year.as_deref().unwrap_or(""),
        card.rating
    );
}

async fn print_listing(queries: &MovieQueries, key: ListingKey) -> Result<()> {
    let page = queries.movies(&key).await?;
    if page.results.is_empty() {
        println!("No movies found.");
        return Ok(());
    }
    for movie in &page.results {
        print_card(&MovieCard::from(movie));
    }
    println!("Page {} of {}", key.page, page.total_pages);
    Ok(())
}

async fn print_detail(queries: &MovieQueries, id: &str) -> Result<()> {
    let state = queries.movie(Some(id)).await;
    if let QueryState::Error(e) = &state {
        eprintln!("{}", e);
    }
    match detail::reconcile(&state, None) {
        DetailView::Loading => println!("Loading..."),
        DetailView::Failed { message, .. } => return Err(anyhow!(message)),
        DetailView::Ready(page) => {
            if let Some(notice) = page.notice() {
                println!("! {}", notice);
            }
            println!("{} ({})", page.title(), page.year_label());
            if let Some(tagline) = page.tagline() {
                println!("  {}", tagline);
            }
            println!("  ★ {} / 10   {}", page.rating_label(), page.runtime_label());
            if let Some(genres) = page.genres() {
                let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
                println!("  {}", names.join(", "));
            }
            println!("\n{}\n", page.overview());
            if let Some(cast) = page.top_cast() {
                for actor in cast {
                    println!("  {} as {}", actor.name, actor.character);
                }
            }
            if let Some(trailer) = page.trailer_url() {
                println!("\nTrailer: {}", trailer);
            }
            if let Some(similar) = page.similar() {
                if !similar.is_empty() {
                    println!("\nSimilar:");
                    similar.iter().for_each(print_card);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = ClientConfig::from_env()?;
    let source = Arc::new(ProxyClient::new(&config)?);
    let queries = MovieQueries::from_config(source, &config);

    match args.first().map(String::as_str) {
        Some("list") => {
            let category: Category = args
                .get(1)
                .map(|c| c.parse::<Category>())
                .transpose()?
                .unwrap_or_default();
            let page = parse_page(args.get(2))?;
            print_listing(&queries, ListingKey::new(category, "", page)).await
        }
        Some("search") => {
            let text = args
                .get(1)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| anyhow!("search needs a query"))?;
            let page = parse_page(args.get(2))?;
            print_listing(&queries, ListingKey::new(Category::Popular, text.as_str(), page)).await
        }
        Some("detail") => {
            let id = args.get(1).ok_or_else(|| anyhow!("detail needs a movie id"))?;
            print_detail(&queries, id).await
        }
        _ => Err(anyhow!(
            "usage: browse list <category> [page] | browse search <text> [page] | browse detail <id>"
        )),
    }
}
