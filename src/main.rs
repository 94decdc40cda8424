//! Client Autofill Entry Point

use client_autofill::{binder, config};

fn main() {
    console_error_panic_hook::set_once();

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    let config = config::load(&window, &document);
    // A second bundle on the page may already own the logger
    let _ = console_logger::init(console_logger::parse_level(&config.log_level));
    log::info!("[APP] client autofill starting ({:?} context)", config.context);

    binder::install(config);
}
