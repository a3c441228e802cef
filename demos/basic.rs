use minds::{ClientOptions, CreateMind, DatabaseConfig, MindUpdate, MindsClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ============================================================================================
    // Step 1: Setup Client
    // ============================================================================================
    // `MINDS_API_KEY` is required; `MINDS_BASE_URL` points at a self-hosted deployment.
    let client = MindsClient::new(ClientOptions::from_env()?.with_log_errors(true))?;

    // ============================================================================================
    // Step 2: Describe a Datasource
    // ============================================================================================
    // A `DatabaseConfig` is created on the server the first time a mind references it.
    let house_sales = DatabaseConfig::new(
        "house_sales",
        "postgres",
        "House sales data",
    )
    .with_connection("user", "demo_user")
    .with_connection("password", "demo_password")
    .with_connection("host", "samples.mindsdb.com")
    .with_connection("port", 5432)
    .with_connection("database", "demo")
    .with_connection("schema", "demo_data")
    .with_tables(["house_sales"]);

    // ============================================================================================
    // Step 3: Create the Mind
    // ============================================================================================
    let mut mind = client
        .minds()
        .create(
            CreateMind::new("house_sales_mind")
                .datasource(house_sales)
                .replace(true),
        )
        .await?;
    println!("Created {} with datasources {:?}", mind.name, mind.datasources);

    mind.update(&client, MindUpdate::new().prompt_template("Answer briefly: {{question}}"))
        .await?;
    println!("Prompt template is now {:?}", mind.prompt_template());

    // ============================================================================================
    // Step 4: Ask a Question
    // ============================================================================================
    let answer = mind
        .completion(&client, "How many three-bedroom houses were sold in 2008?")
        .await?;
    println!("{answer}");

    for ds in client.datasources().all().await? {
        println!("{} ({})", ds.name, ds.engine);
    }

    Ok(())
}
