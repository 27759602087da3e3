use interiora::prelude::*;
use interiora_realtime::ConnectionState;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let email = std::env::var("INTERIORA_EMAIL").map_err(|_| Error::config("INTERIORA_EMAIL must be set"))?;
    let password = std::env::var("INTERIORA_PASSWORD")
        .map_err(|_| Error::config("INTERIORA_PASSWORD must be set"))?;

    let client = Interiora::from_env()?;
    client.login(&email, &password).await?;

    let mut feed = client.notifications();
    feed.fetch(true).await?;
    while feed.on_sentinel_visible().await? {}
    for notification in feed.items() {
        let marker = if notification.is_read { " " } else { "*" };
        println!("{} {}", marker, notification.message);
    }

    let socket = client.connect_notifications().await?;
    let mut unread = socket.subscribe_unread();
    let mut state = socket.on_state_change();

    println!("Listening for unread counts for 30 seconds");
    let deadline = sleep(Duration::from_secs(30));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = unread.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("Unread: {}", *unread.borrow());
            }
            Ok(next) = state.recv() => {
                println!("Socket {:?}", next);
                if next == ConnectionState::Disconnected {
                    break;
                }
            }
        }
    }

    socket.disconnect().await?;
    Ok(())
}
