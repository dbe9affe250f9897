use chrono::Utc;
use tracing_subscriber::EnvFilter;
use webcal_week::render::{event_left_position, event_width, format_event_time};
use webcal_week::window::window_around;
use webcal_week::{filter_events_with_recurring, layout_for_day, snapshot, Config, Russian};

fn main() -> webcal_week::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let events = match snapshot::load_events(&config.json_path, &Russian)? {
        Some(events) => events,
        None => {
            eprintln!("no snapshot at {}", config.json_path.display());
            return Ok(());
        }
    };

    let now = Utc::now().with_timezone(&config.display_offset);
    let days = window_around(now.date_naive(), config.days_in_past, config.days_in_future);
    let shown: Vec<_> = events
        .into_iter()
        .map(|event| event.with_offset(config.display_offset))
        .collect();

    for bucket in filter_events_with_recurring(&shown, &days).iter() {
        println!("{}", bucket.date.format("%a %Y-%m-%d"));
        let columns = layout_for_day(bucket.date, &bucket.events);
        for event in &bucket.events {
            let width = event_width(event, &columns)
                .map_or_else(|| "full".to_string(), |w| format!("{:.2}%", w));
            println!(
                "  {:<13} {} [left {:.2}%, width {}]",
                format_event_time(event, &Russian),
                event.summary,
                event_left_position(event, &columns),
                width,
            );
        }
    }
    Ok(())
}
