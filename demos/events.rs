//! Listener lifecycle: connect, receive replay and updates, disconnect.

use partyline::Bus;
use serde_json::json;

fn main() {
    let bus = Bus::new();
    bus.set_store("CART", json!({"items": 0}));

    // Replays the current value immediately, then every later change.
    bus.connect_to_store("cart-badge", "CART", |cart| {
        println!("cart badge sees: {cart}");
    });

    bus.update_store("CART", json!({"items": 2}));
    bus.update_store("CART", json!({"items": 3}));

    // Watch a single nested path; unchanged values are suppressed.
    bus.connect_to_state("cart-total", "CART", "items", |items| {
        println!("item count changed to {items}");
    });
    bus.update_store("CART", json!({"discount": true}));
    bus.update_store("CART", json!({"items": 4}));

    // On unmount.
    bus.disconnect_from_stores("cart-badge");
    bus.disconnect_from_stores("cart-total");
    bus.update_store("CART", json!({"items": 5}));
    println!("final cart: {:?}", bus.get_store("CART"));
}
