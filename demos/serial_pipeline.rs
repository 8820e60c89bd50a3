use asyncflow::{BoxStage, serial, task::boxed_stage};

#[tokio::main]
async fn main() {
    let dir = std::env::temp_dir().join("asyncflow-serial-demo");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let first = dir.join("first.txt");
    let second = dir.join("second.txt");
    tokio::fs::write(&first, "1 line").await.unwrap();
    tokio::fs::write(&second, "2 line").await.unwrap();

    // Each stage reads one file and appends it to what came before.
    let stages: Vec<BoxStage<String, std::io::Error>> = [first, second]
        .into_iter()
        .map(|path| {
            boxed_stage(move |previous: Option<String>| async move {
                let text = tokio::fs::read_to_string(&path).await?;
                Ok::<_, std::io::Error>(match previous {
                    Some(previous) => format!("{previous} {text}"),
                    None => text,
                })
            })
        })
        .collect();

    serial(stages, |result| match result {
        Ok(text) => println!("Read: {text}"),
        Err(error) => println!("Read failed: {error}"),
    })
    .await;

    let missing: Vec<BoxStage<String, std::io::Error>> = vec![boxed_stage(|_| async {
        tokio::fs::read_to_string("does/not/exist.txt").await
    })];
    serial(missing, |result| {
        assert!(result.is_err());
        println!("Missing file reported: {result:?}");
    })
    .await;

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
