//! File-backed stores: state survives across engine instances.

use partyline::{Bus, FileBackend};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("partyline-demo");

    {
        let bus = Bus::with_local(FileBackend::new(&dir)?);
        bus.init_store("SETTINGS", json!({"theme": "dark", "volume": 7}));
        bus.set_state("SETTINGS", "volume", 9);
        println!("saved settings: {:?}", bus.get_store("SETTINGS"));
    }

    // A fresh engine over the same directory sees the same stores, and
    // connecting replays the persisted value.
    let bus = Bus::with_local(FileBackend::new(&dir)?);
    bus.connect_to_store("settings-panel", "SETTINGS", |settings| {
        println!("replayed from disk: {settings}");
    });

    Ok(())
}
