use reviewlens_analytics::charts::ChartKind;

pub const LINE_KEYWORDS: [&str; 4] = ["trend", "over time", "monthly", "change"];
pub const PIE_KEYWORDS: [&str; 4] = ["distribution", "breakdown", "percentage", "composition"];

/// Chart kind used when neither an explicit kind nor a keyword applies.
pub const DEFAULT_BAR_KIND: ChartKind = ChartKind::StackedBar;

/// Chart names that are recognised but not rendered.
const UNSUPPORTED_KINDS: [&str; 8] =
    ["scatter", "histogram", "heatmap", "treemap", "gantt", "candlestick", "violin", "spider"];

/// Everyday words that only name a chart kind when followed by a chart noun.
const QUALIFIED_UNSUPPORTED_KINDS: [&str; 9] =
    ["area", "bubble", "radar", "box", "funnel", "waterfall", "polar", "donut", "doughnut"];

const CHART_NOUNS: [&str; 5] = ["chart", "plot", "graph", "diagram", "map"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartSelection {
    Kind(ChartKind),
    /// The request named a chart kind outside the supported set.
    Unsupported(String),
}

/// Picks exactly one chart kind for a plotting request.
///
/// An explicitly named kind wins. A named but unsupported kind is reported as
/// such. Otherwise trend words select a line chart, composition words select
/// a pie chart, and everything else gets [`DEFAULT_BAR_KIND`].
pub fn select_chart_kind(request_text: &str) -> ChartSelection {
    let normalized = request_text.to_lowercase();
    let tokens = tokenize(&normalized);

    if let Some(selection) = chart_type_argument(&tokens) {
        return selection;
    }
    if let Some(kind) = explicit_kind(&tokens) {
        return ChartSelection::Kind(kind);
    }
    if let Some(name) = unsupported_kind(&tokens) {
        return ChartSelection::Unsupported(name);
    }

    if LINE_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        ChartSelection::Kind(ChartKind::Line)
    } else if PIE_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        ChartSelection::Kind(ChartKind::Pie)
    } else {
        ChartSelection::Kind(DEFAULT_BAR_KIND)
    }
}

/// `chart type <kind>` / `chart_type <kind>`: the token after it is taken as
/// the requested kind verbatim.
fn chart_type_argument(tokens: &[String]) -> Option<ChartSelection> {
    let position = tokens
        .windows(2)
        .position(|pair| pair[0] == "chart" && pair[1] == "type")
        .map(|index| index + 2)
        .or_else(|| tokens.iter().position(|token| token == "chart_type").map(|index| index + 1))?;

    let requested = tokens.get(position)?;
    let candidate = match tokens.get(position + 1).map(String::as_str) {
        Some("bar") if matches!(requested.as_str(), "stacked" | "simple") => {
            format!("{requested}_bar")
        }
        _ => requested.clone(),
    };

    Some(match candidate.parse::<ChartKind>() {
        Ok(kind) => ChartSelection::Kind(kind),
        Err(_) => ChartSelection::Unsupported(candidate),
    })
}

fn explicit_kind(tokens: &[String]) -> Option<ChartKind> {
    const BAR_WORDS: [&str; 2] = ["bar", "bars"];

    tokens.iter().enumerate().find_map(|(index, token)| match token.as_str() {
        "stacked_bar" | "stacked-bar" => Some(ChartKind::StackedBar),
        "simple_bar" | "simple-bar" => Some(ChartKind::SimpleBar),
        "stacked" if followed_by(tokens, index, &BAR_WORDS) => Some(ChartKind::StackedBar),
        "simple" if followed_by(tokens, index, &BAR_WORDS) => Some(ChartKind::SimpleBar),
        "pie" if followed_by(tokens, index, &CHART_NOUNS) => Some(ChartKind::Pie),
        "line" if followed_by(tokens, index, &CHART_NOUNS) => Some(ChartKind::Line),
        _ => None,
    })
}

fn unsupported_kind(tokens: &[String]) -> Option<String> {
    tokens.iter().enumerate().find_map(|(index, token)| {
        let name = token.as_str();
        let unsupported = UNSUPPORTED_KINDS.contains(&name)
            || (QUALIFIED_UNSUPPORTED_KINDS.contains(&name)
                && followed_by(tokens, index, &CHART_NOUNS));
        unsupported.then(|| token.clone())
    })
}

fn followed_by(tokens: &[String], index: usize, words: &[&str]) -> bool {
    tokens.get(index + 1).is_some_and(|next| words.contains(&next.as_str()))
}

fn tokenize(normalized_text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(normalized_text.len());
    for character in normalized_text.chars() {
        if character.is_alphanumeric() || matches!(character, '_' | '-') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}
