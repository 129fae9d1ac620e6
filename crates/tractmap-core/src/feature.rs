use crate::PLACEHOLDER;
use html_escape::encode_text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY_METRO: &str = "CBSA_NAME";
pub const KEY_CLASS: &str = "classtype";
pub const KEY_RENT: &str = "ConRent_mean_2020";
pub const KEY_HOUSE_VALUE: &str = "HouseValue_mean_2020";
pub const KEY_INCOME: &str = "HHIncome_mean_2020";
pub const KEY_POVERTY: &str = "Poverty_pct_2020";
pub const KEY_BACHELOR: &str = "Bach_pct_2020";
pub const KEY_WHITE_COLLAR: &str = "WhiteCollar_pct_2020";

/// A rendered map feature as handed over by the engine. Never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Id of the style layer the feature was rendered from, when known.
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(layer: Option<&str>, properties: Map<String, Value>) -> Self {
        Self {
            layer: layer.map(str::to_string),
            properties,
        }
    }

    /// Attribute rendered as text. Integral floats lose their trailing `.0`
    /// so numeric ids keep their usual spelling.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => Some(i.to_string()),
                (_, Some(u), _) => Some(u.to_string()),
                (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
                    Some(format!("{:.0}", f))
                }
                (_, _, Some(f)) => Some(f.to_string()),
                _ => None,
            },
            other => Some(other.to_string()),
        }
    }

    /// Attribute parsed as a finite number. Strings are trimmed and parsed;
    /// null, blank, and non-numeric values yield `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        let n = match self.properties.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => return None,
        };
        n.is_finite().then_some(n)
    }
}

/// Display strings for the detail panel and popups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TractDetails {
    pub tract: String,
    pub metro: String,
    pub class: String,
    pub index: String,
    pub rent: String,
    pub house_value: String,
    pub income: String,
    pub poverty: String,
    pub bachelor: String,
    pub white_collar: String,
}

impl TractDetails {
    pub fn from_feature(feature: &Feature, id_key: &str, index_key: &str) -> Self {
        let tract = feature
            .text(id_key)
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let metro = feature
            .text(KEY_METRO)
            .and_then(|name| {
                let head = name.split(',').next().unwrap_or("").to_string();
                (!head.is_empty()).then_some(head)
            })
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let class = feature
            .text(KEY_CLASS)
            .map(|c| capitalize_first(&c))
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        Self {
            tract,
            metro,
            class,
            index: fixed2(feature.number(index_key)),
            rent: money(feature.number(KEY_RENT)),
            house_value: money(feature.number(KEY_HOUSE_VALUE)),
            income: money(feature.number(KEY_INCOME)),
            poverty: pct(feature.number(KEY_POVERTY)),
            bachelor: pct(feature.number(KEY_BACHELOR)),
            white_collar: pct(feature.number(KEY_WHITE_COLLAR)),
        }
    }

    /// Small popup shown while hovering.
    pub fn hover_html(&self) -> String {
        format!(
            "<div class=\"popup-wrapper\">\
             <div class=\"popup-title\">tract {}</div>\
             <div class=\"popup-title\">index {}</div>\
             </div>",
            encode_text(&self.tract),
            encode_text(&self.index)
        )
    }

    /// Popup pinned at the selected tract.
    pub fn selected_html(&self) -> String {
        format!(
            "<div class=\"popup-wrapper popup-selected\">\
             <div class=\"popup-title\">tract {}</div>\
             <div class=\"popup-body\">{}</div>\
             <div class=\"popup-body\">{}</div>\
             <div class=\"popup-title\">index {}</div>\
             </div>",
            encode_text(&self.tract),
            encode_text(&self.metro),
            encode_text(&self.class),
            encode_text(&self.index)
        )
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn fixed2(value: Option<f64>) -> String {
    match value {
        Some(n) => format!("{:.2}", n),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn pct(value: Option<f64>) -> String {
    match value {
        Some(n) => format!("{:.2}%", n),
        None => PLACEHOLDER.to_string(),
    }
}

/// US dollar amount with thousands separators and two decimals.
pub fn money(value: Option<f64>) -> String {
    let Some(n) = value else {
        return PLACEHOLDER.to_string();
    };

    let fixed = format!("{:.2}", n.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // -0.001 rounds to 0.00 and must not print a sign
    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("$ {}{}.{}", sign, grouped, cents)
}
