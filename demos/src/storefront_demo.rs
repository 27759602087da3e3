use interiora::prelude::*;
use interiora::services::AvailabilityQuery;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let email = env::var("INTERIORA_EMAIL").map_err(|_| Error::config("INTERIORA_EMAIL must be set"))?;
    let password =
        env::var("INTERIORA_PASSWORD").map_err(|_| Error::config("INTERIORA_PASSWORD must be set"))?;

    let client = Interiora::from_env()?;
    let session = client.login(&email, &password).await?;
    println!("Logged in (admin: {})", session.is_admin());

    let catalog = client.catalog();
    for section in catalog.sections().await? {
        println!("Section {}: {}", section.id, section.name);
        for category in catalog.categories(Some(section.id)).await? {
            println!("  Category {}: {}", category.id, category.name);
        }
    }

    let mut checkout = client.checkout(None).await?;
    println!(
        "Cart has {} line(s), total {}",
        checkout.cart().cart().items.len(),
        checkout.cart().cart().total()
    );

    if checkout.begin().is_ok() {
        if let (Ok(phone), Ok(address), Ok(city), Ok(postal_code)) = (
            env::var("INTERIORA_PHONE"),
            env::var("INTERIORA_ADDRESS"),
            env::var("INTERIORA_CITY"),
            env::var("INTERIORA_POSTAL_CODE"),
        ) {
            *checkout.shipping_mut() = ShippingInfo {
                email: email.clone(),
                phone,
                address,
                city,
                postal_code,
            };
            let order_id = checkout.submit_shipping().await?;
            println!("Created order {}", order_id);

            // Redirect payments need no card processor.
            let state = checkout.pay(PaymentProvider::Redirect, None).await?;
            println!("Checkout state: {}", state);
        } else {
            println!("Set INTERIORA_PHONE, INTERIORA_ADDRESS, INTERIORA_CITY and INTERIORA_POSTAL_CODE to place an order");
        }
    }

    let services = client.services();
    let settings = services.settings().await?;
    if let Some(cost) = settings.consultation_cost(90) {
        println!("A 90 minute consultation costs {}", cost);
    }

    if let Some(consultant) = services.consultants().await?.first() {
        let mut query = AvailabilityQuery::new();
        query.consultant = Some(consultant.id);
        query.date = Some(chrono::Local::now().date_naive());
        query.duration_minutes = Some(60);
        for slot in query.fetch_slots(&services).await? {
            println!("{} is free at {}", consultant.name, slot.start);
        }
    }

    for order in client.orders().history().await? {
        println!("Order {} ({})", order.id, order.status.as_deref().unwrap_or("unknown"));
    }

    client.logout();
    Ok(())
}
