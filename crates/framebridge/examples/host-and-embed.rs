//! A host page and its embedded frame exchanging calls over an in-memory
//! mailbox.
//!
//! Run: `cargo run -p framebridge --example host-and-embed`

use framebridge::peer::{Bridge, Direction, HostParts, MemoryLocation, MemoryStore};
use framebridge::transport::Mailbox;
use framebridge::viewport::memory::{
    MemoryFullscreen, MemoryStyle, MemoryViewport, MemoryVisibility,
};
use serde_json::{json, Value};

fn parts(mailbox: &Mailbox, href: &str, referrer: &str) -> HostParts {
    HostParts {
        events: Box::new(mailbox.clone()),
        style: Box::new(MemoryStyle::default()),
        viewport: Box::new(MemoryViewport::missing()),
        fullscreen: Box::new(MemoryFullscreen::standard()),
        visibility: Some(Box::new(MemoryVisibility::supported())),
        storage: Some(Box::new(MemoryStore::new())),
        location: Box::new(MemoryLocation::new(href, referrer)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mailbox = Mailbox::new();
    let host_window = mailbox.open_window("https://host.example");
    let frame_window = mailbox.open_window("https://embed.example");

    let mut host = Bridge::builder()
        .child(
            mailbox.target(host_window, frame_window),
            "https://embed.example/player",
            None,
        )
        .build(parts(&mailbox, "https://host.example/watch", ""));

    let mut frame = Bridge::builder()
        .parent(mailbox.target(frame_window, host_window))
        .operation("handleParentDocumentEvent", |_, args| {
            println!("frame <- {}", args.get(0).cloned().unwrap_or(Value::Null));
            None
        })?
        .build(parts(
            &mailbox,
            "https://embed.example/player",
            "https://host.example/watch",
        ));

    // Queued until the frame acknowledges the handshake.
    host.call_child("setLocalStorageItem", json!(["volume", 0.7]));
    host.enter_full_browser();

    while let Some(delivery) = mailbox.pop() {
        println!("{:>8} -> {}", delivery.message.origin, delivery.message.data);
        if delivery.to == host_window {
            host.handle_message(&delivery.message);
        } else {
            frame.handle_message(&delivery.message);
        }
    }

    println!(
        "host link: {:?}, frame volume: {:?}",
        host.link_state(Direction::Child),
        frame.local_storage_item("volume")
    );
    Ok(())
}
