use std::time::Duration;

use asyncflow::{FanOut, make_async};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("asyncflow=trace")),
        )
        .with_target(false)
        .init();

    let fetch = make_async(
        |page: Option<u32>| match page {
            Some(7) => Err("page 7 is gone".to_string()),
            Some(page) => Ok(format!("contents of page {page}")),
            None => Err("no page requested".to_string()),
        },
        Duration::from_millis(300),
    );

    let mut fan_out = FanOut::new();
    for page in 1..=8 {
        let fetch = fetch.clone();
        fan_out.push(move || {
            println!("Fetching page {page}");
            fetch.call_with(page)
        });
    }
    fan_out
        .limit(3)
        .on_error(|index, error| println!("Task {index} failed: {error}"));

    fan_out
        .run(|result| match result {
            Ok(pages) => pages.iter().for_each(|page| println!("{page}")),
            Err(error) => println!("Batch failed: {error}"),
        })
        .await;
}
