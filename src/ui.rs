use log::info;

/// Navigation/menu host, invoked fire-and-forget when a user taps a symbol.
/// The real host lives outside this crate; consumers hand the engine's UI
/// layer any implementation of this trait.
pub trait UiHost: Send + Sync {
    /// Open the symbol's detail page.
    fn navigate_to_symbol(&self, symbol_id: &str);

    /// Show the symbol's quick-action menu.
    fn display_symbol_menu(&self, symbol_id: &str);
}

/// Stand-in host that just logs the request.
pub struct LoggingUiHost;

impl UiHost for LoggingUiHost {
    fn navigate_to_symbol(&self, symbol_id: &str) {
        info!("navigate to symbol page: {}", symbol_id);
    }

    fn display_symbol_menu(&self, symbol_id: &str) {
        info!("display symbol menu: {}", symbol_id);
    }
}
