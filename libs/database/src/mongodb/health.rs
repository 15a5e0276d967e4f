use mongodb::{Client, Database, bson::doc};

/// `true` when the server answers a `ping` on the admin database.
pub async fn check_health(client: &Client) -> bool {
    ping(&client.database("admin")).await.is_ok()
}

/// Run the `ping` command against `db`.
pub async fn ping(db: &Database) -> mongodb::error::Result<()> {
    db.run_command(doc! { "ping": 1 }).await.map(|_| ())
}
