//! Basic store usage: set, update, and read named stores.

use partyline::Bus;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct UserProfile {
    username: String,
    email: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = Bus::new();

    // Typed state serializes straight into a store.
    let profile = UserProfile {
        username: "somebody".to_string(),
        email: "somebody@example.com".to_string(),
    };
    bus.set_store("USER", serde_json::to_value(&profile)?);

    // Shallow merge: only the listed top-level keys change.
    bus.update_store("USER", json!({"email": "somebody@else.com"}));

    println!("user store: {:?}", bus.get_store("USER"));
    println!("email only: {:?}", bus.get_state("USER", "email"));

    // Primitive stores work too; wrapping is transparent.
    bus.set_store("GREETING", "hello");
    println!("greeting: {:?}", bus.get_store("GREETING"));

    Ok(())
}
