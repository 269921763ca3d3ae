//! CLI walk-through of the ticketbook stores.
//!
//! Drives the add-ticket wizard end to end against the mock capabilities,
//! commits the finished draft to the ticket store, and prints the derived
//! views a screen would render.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use ticketbook::flow::{ImageSource, ReviewMode};
use ticketbook::media::{ImageSettings, MockImageGenerator, UnavailableSpeechRecognizer};
use ticketbook::types::NewTicket;
use ticketbook::{
    AppConfig, FlowAction, FlowEnvironment, FlowReducer, FlowState, TicketAction,
    TicketEnvironment, TicketReducer, TicketState, TicketStatus, views,
};
use ticketbook_runtime::Store;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let tickets = Store::new(
        TicketState::new(),
        TicketReducer::new(),
        TicketEnvironment::production(),
    );

    let flow = Store::new(
        FlowState::new(),
        FlowReducer::new(),
        FlowEnvironment::new(
            MockImageGenerator::shared(config.image.delay, config.image.base_url.clone()),
            UnavailableSpeechRecognizer::shared(),
        ),
    );

    println!("=== Ticketbook ===\n");

    // Walk the wizard the way the screens would
    println!("Entering performance details...");
    flow.send(FlowAction::SubmitDetails {
        title: "Live Club Day".to_string(),
        artist: "Silica Gel".to_string(),
        place: "Rolling Hall".to_string(),
        booking_site: "Interpark".to_string(),
        performed_at: Utc::now(),
    })
    .await?;

    // Dictation is requested but the recognizer reports unavailable;
    // the flow falls back to typed input.
    let mut handle = flow
        .send(FlowAction::ChooseReviewMode {
            mode: ReviewMode::Voice,
        })
        .await?;
    handle.wait().await;

    if let Some(notice) = flow.state(|s| s.dictation_notice.clone()).await {
        println!("Dictation unavailable ({notice}), typing instead");
    }

    flow.send(FlowAction::SubmitReview {
        text: "Wall of sound, unforgettable encore.".to_string(),
        visibility: TicketStatus::Public,
    })
    .await?;

    println!("Generating a ticket image...");
    flow.send(FlowAction::ChooseImageSource {
        source: ImageSource::Generate,
    })
    .await?;

    let generation_timeout = config.image.delay + Duration::from_secs(10);
    let result = flow
        .send_and_wait_for(
            FlowAction::ConfigureImage {
                settings: ImageSettings::default(),
            },
            |action| {
                matches!(
                    action,
                    FlowAction::ImageGenerated { .. } | FlowAction::ImageFailed { .. }
                )
            },
            generation_timeout,
        )
        .await?;

    match result {
        FlowAction::ImageGenerated { image } => println!("Image ready: {}", image.url),
        FlowAction::ImageFailed { message } => println!("Image generation failed: {message}"),
        _ => {},
    }

    flow.send(FlowAction::Finalize).await?;
    let input = flow
        .state(|s| s.finished.clone())
        .await
        .context("wizard did not produce a finished draft")?;

    // The terminal step commits once, synchronously, to the ticket store
    tickets.send(TicketAction::AddTicket { input }).await?;

    // A second entry added directly through the store API
    tickets
        .send(TicketAction::AddTicket {
            input: NewTicket {
                title: "Nell's Seasonal Concert".to_string(),
                artist: "Nell".to_string(),
                place: "Olympic Hall".to_string(),
                booking_site: "Melon Ticket".to_string(),
                performed_at: Utc::now(),
                status: Some(TicketStatus::Private),
                review: None,
                images: Vec::new(),
            },
        })
        .await?;

    // Derived views, recomputed from the base collection
    let state = tickets.state(Clone::clone).await;
    println!("\nTickets: {}", state.count());
    println!("  public: {}", state.public_tickets().len());
    println!("  private: {}", state.private_tickets().len());

    for ticket in &state.tickets {
        println!(
            "  [{}] {} - {} @ {}",
            ticket.status, ticket.title, ticket.artist, ticket.place
        );
    }

    let grid = views::padded_grid(&state, config.grid_size);
    let filled = grid.iter().filter(|t| !t.is_placeholder).count();
    println!(
        "\nGrid: {filled} tickets, {} empty cards",
        grid.len() - filled
    );

    println!("Performance days: {:?}", views::performance_dates(&state));

    if let Some(first) = state.tickets.first() {
        println!("\nShared ticket JSON:\n{}", serde_json::to_string_pretty(first)?);

        // Flip visibility, then remove the second entry
        let mut edited = first.clone();
        edited.status = TicketStatus::Private;
        tickets
            .send(TicketAction::UpdateTicket { ticket: edited })
            .await?;
    }

    if let Some(second_id) = tickets.state(|s| s.tickets.get(1).map(|t| t.id)).await {
        tickets
            .send(TicketAction::DeleteTicket { id: second_id })
            .await?;
    }

    let state = tickets.state(Clone::clone).await;
    println!(
        "\nAfter update + delete: {} ticket(s), {} private",
        state.count(),
        state.private_tickets().len()
    );

    flow.shutdown(Duration::from_secs(5)).await?;
    tickets.shutdown(Duration::from_secs(5)).await?;

    println!("\n=== Done ===");
    Ok(())
}
