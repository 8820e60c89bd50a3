use std::time::Duration;

use asyncflow::{Timer, make_async, map, timing::Sleep};
use macro_rules_attribute::apply;
use smol_macros::{Executor, main};

struct SmolTimer;

impl Timer for SmolTimer {
    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(async move {
            smol::Timer::after(duration).await;
        })
    }
}

#[apply(main!)]
async fn main(ex: &Executor<'_>) {
    let word_count = make_async(
        |text: Option<&str>| Ok::<_, String>(text.unwrap_or_default().split_whitespace().count()),
        Duration::from_millis(200),
    )
    .with_timer(SmolTimer);

    let lines = ["the quick brown fox", "jumps over", "the lazy dog"];
    map(
        lines,
        |line| ex.spawn(word_count.call_with(line)),
        |counts| match counts {
            Ok(counts) => println!("Word counts: {counts:?}"),
            Err(error) => println!("Counting failed: {error}"),
        },
    )
    .await;
}
