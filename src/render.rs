use crate::quote::{base_code, Quote};

/// Field selector for [`render_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    SymbolId,
    Name,
    TradeDate,
    Open,
    High,
    Low,
    Close,
    Change,
    ChangeRatio,
    TotalVolume,
    Time,
    TickVolume,
}

/// Prefix style for the change field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePrefix {
    None,
    Triangle,
    PlusMinus,
}

/// Presentation hint attached to a rendered value. `None` means the field
/// carries no price semantics (or no data yet); `Neutral` is an unchanged
/// price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    None,
    Neutral,
    Up,
    Down,
    LimitUp,
    LimitDown,
}

/// Map a quote snapshot and a field selector to display text plus a color
/// class. Pure function; holds no state and never touches subscriptions.
pub fn render_field(quote: &Quote, field: FieldKind, prefix: ChangePrefix) -> (String, ColorClass) {
    match field {
        FieldKind::SymbolId => (quote.symbol_id.clone(), ColorClass::None),
        FieldKind::Name => {
            let name = if quote.name.is_empty() {
                base_code(&quote.symbol_id).to_string()
            } else {
                quote.name.clone()
            };
            (name, ColorClass::None)
        }
        FieldKind::TradeDate => {
            if quote.date == 0 {
                ("-".to_string(), ColorClass::None)
            } else {
                (quote.date.to_string(), ColorClass::None)
            }
        }
        FieldKind::Open => price_cell(quote, quote.open),
        FieldKind::High => price_cell(quote, quote.high),
        FieldKind::Low => price_cell(quote, quote.low),
        FieldKind::Close => price_cell(quote, quote.close),
        FieldKind::Change => change_cell(quote, prefix),
        FieldKind::ChangeRatio => change_ratio_cell(quote),
        FieldKind::TotalVolume => (quote.total_volume.to_string(), ColorClass::None),
        FieldKind::Time => {
            if quote.close == 0.0 {
                ("-".to_string(), ColorClass::None)
            } else {
                (format!("{:06}", quote.tick.time), ColorClass::None)
            }
        }
        FieldKind::TickVolume => {
            if quote.close == 0.0 {
                ("0".to_string(), ColorClass::None)
            } else {
                (quote.tick.volume.to_string(), ColorClass::None)
            }
        }
    }
}

/// Price fields color against the previous close; a price sitting on a set
/// limit gets the distinct limit color.
fn price_cell(quote: &Quote, price: f64) -> (String, ColorClass) {
    if quote.close == 0.0 || price == 0.0 {
        return ("-".to_string(), ColorClass::None);
    }

    let color = if price > quote.prev_close {
        if quote.upper_limit > 0.0 && price >= quote.upper_limit {
            ColorClass::LimitUp
        } else {
            ColorClass::Up
        }
    } else if price < quote.prev_close {
        if quote.down_limit > 0.0 && price <= quote.down_limit {
            ColorClass::LimitDown
        } else {
            ColorClass::Down
        }
    } else {
        ColorClass::Neutral
    };

    (format_price(price, quote.dp), color)
}

fn change_cell(quote: &Quote, prefix: ChangePrefix) -> (String, ColorClass) {
    if quote.close == 0.0 || quote.prev_close == 0.0 {
        return ("-".to_string(), ColorClass::None);
    }

    let change = quote.change();
    let color = sign_color(change);

    let text = match prefix {
        ChangePrefix::None => format_price(change, quote.dp),
        ChangePrefix::PlusMinus => {
            let text = format_price(change, quote.dp);
            if change > 0.0 {
                format!("+{}", text)
            } else {
                text
            }
        }
        ChangePrefix::Triangle => {
            let magnitude = format_price(change.abs(), quote.dp);
            if change > 0.0 {
                format!("\u{25b2}{}", magnitude)
            } else if change < 0.0 {
                format!("\u{25bc}{}", magnitude)
            } else {
                magnitude
            }
        }
    };

    (text, color)
}

/// Magnitude only, two decimals, '%' suffix; the sign shows through the color.
fn change_ratio_cell(quote: &Quote) -> (String, ColorClass) {
    if quote.close == 0.0 || quote.prev_close == 0.0 {
        return ("-".to_string(), ColorClass::None);
    }

    let ratio = quote.change_ratio();
    (format!("{:.2}%", ratio.abs()), sign_color(ratio))
}

fn sign_color(value: f64) -> ColorClass {
    if value > 0.0 {
        ColorClass::Up
    } else if value < 0.0 {
        ColorClass::Down
    } else {
        ColorClass::Neutral
    }
}

fn format_price(value: f64, dp: u32) -> String {
    format!("{:.*}", dp as usize, value)
}
