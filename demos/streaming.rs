use futures::StreamExt;
use std::io::{self, Write};

use minds::MindsClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = MindsClient::from_env()?;
    let mind = client.minds().find("house_sales_mind").await?;

    // Deltas arrive in order as the mind writes its answer; dropping the
    // stream early closes the connection.
    let mut stream = mind
        .completion_stream(&client, "Which neighborhood had the most sales?")
        .await?;

    while let Some(delta) = stream.next().await {
        if let Some(content) = delta?.content {
            print!("{content}");
            io::stdout().flush()?;
        }
    }
    println!();

    Ok(())
}
