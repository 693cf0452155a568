use crate::core::{ProjectionResult, YearSummary, round_cents};

const INDEX_TEMPLATE: &str = include_str!("../../web/index.html");

/// Shown for every input failure; the detailed cause only goes to the log.
pub const GENERIC_INPUT_ERROR: &str = "Please fill in all fields with valid numbers.";

/// The raw field values echoed back into the form.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormEcho<'a> {
    pub principal: &'a str,
    pub monthly: &'a str,
    pub rate: &'a str,
    pub years: &'a str,
}

pub enum Outcome<'a> {
    Blank,
    InputError,
    Projection {
        years: u32,
        result: &'a ProjectionResult,
        breakdown: &'a [YearSummary],
        chart_uri: Option<&'a str>,
    },
}

pub fn render_page(form: FormEcho<'_>, outcome: Outcome<'_>) -> String {
    let outcome_html = match outcome {
        Outcome::Blank => String::new(),
        Outcome::InputError => format!(
            "    <div class=\"error\">{}</div>\n",
            escape_html(GENERIC_INPUT_ERROR)
        ),
        Outcome::Projection {
            years,
            result,
            breakdown,
            chart_uri,
        } => render_projection(years, result, breakdown, chart_uri),
    };

    INDEX_TEMPLATE
        .replace("{{principal}}", &escape_html(form.principal))
        .replace("{{monthly}}", &escape_html(form.monthly))
        .replace("{{rate}}", &escape_html(form.rate))
        .replace("{{years}}", &escape_html(form.years))
        .replace("{{outcome}}\n", &outcome_html)
}

fn render_projection(
    years: u32,
    result: &ProjectionResult,
    breakdown: &[YearSummary],
    chart_uri: Option<&str>,
) -> String {
    let chart_html = chart_uri
        .map(|uri| format!("    <img class=\"chart\" alt=\"Balance by month\" src=\"{uri}\">\n"))
        .unwrap_or_default();
    let rows_html: String = breakdown
        .iter()
        .map(|row| {
            format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                row.year,
                format_currency(row.balance),
                format_currency(row.invested),
                format_currency(row.profit)
            )
        })
        .collect();

    format!(
        "    <div class=\"result\">\n\
         \x20     <div>Total after {years} years: {final_balance}</div>\n\
         \x20     <div>Total invested: {invested}</div>\n\
         \x20     <div>Accumulated profit: {profit}</div>\n\
         \x20   </div>\n\
         {chart_html}\
         \x20   <table class=\"yearly\">\n\
         \x20     <thead><tr><th>Year</th><th>Balance</th><th>Invested</th><th>Profit</th></tr></thead>\n\
         \x20     <tbody>\n\
         {rows_html}\
         \x20     </tbody>\n\
         \x20   </table>\n",
        final_balance = format_currency(result.final_balance),
        invested = format_currency(result.total_invested),
        profit = format_currency(result.total_profit),
    )
}

/// Two decimals with comma thousands separators, e.g. `94,111.23`.
pub fn format_currency(value: f64) -> String {
    let cents = round_cents(value);
    let digits = format!("{:.2}", cents.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((&digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProjectionInput, project, yearly_breakdown};

    #[test]
    fn currency_is_grouped_and_rounded() {
        assert_eq!(format_currency(94_111.2346997367), "94,111.23");
        assert_eq!(format_currency(70_000.0), "70,000.00");
        assert_eq!(format_currency(1_234_567.891), "1,234,567.89");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(12.5), "12.50");
        assert_eq!(format_currency(-4_321.0), "-4,321.00");
        assert_eq!(format_currency(-0.001), "0.00");
        assert_eq!(format_currency(0.0), "0.00");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn blank_page_has_empty_form_and_no_outcome() {
        let html = render_page(FormEcho::default(), Outcome::Blank);
        assert!(html.contains("name=\"principal\""));
        assert!(html.contains("value=\"\""));
        assert!(!html.contains("{{"));
        assert!(!html.contains("class=\"error\""));
        assert!(!html.contains("class=\"result\""));
    }

    #[test]
    fn error_page_echoes_escaped_input() {
        let form = FormEcho {
            principal: "<script>",
            monthly: "500",
            rate: "5",
            years: "ten",
        };
        let html = render_page(form, Outcome::InputError);
        assert!(html.contains(GENERIC_INPUT_ERROR));
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(html.contains("value=\"ten\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn projection_page_lists_summary_chart_and_years() {
        let input = ProjectionInput::new(10_000.0, 500.0, 5.0, 10).unwrap();
        let result = project(&input);
        let breakdown = yearly_breakdown(&input, &result);
        let html = render_page(
            FormEcho {
                principal: "10000",
                monthly: "500",
                rate: "5",
                years: "10",
            },
            Outcome::Projection {
                years: 10,
                result: &result,
                breakdown: &breakdown,
                chart_uri: Some("data:image/png;base64,AAAA"),
            },
        );

        assert!(html.contains("Total after 10 years: 94,111.23"));
        assert!(html.contains("Total invested: 70,000.00"));
        assert!(html.contains("Accumulated profit: 24,111.23"));
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
        assert_eq!(html.matches("<tr><td>").count(), 10);
        assert!(html.contains("<td>10</td><td>94,111.23</td><td>70,000.00</td><td>24,111.23</td>"));
    }
}
