//! Prompt templates for the mapping and advisor flows.
//!
//! All prompt text lives here, as minijinja templates compiled once. The
//! mapping prompt requests the exact four-line format that
//! `ledgermap_core::suggestion` parses; if one changes, change the other.

use ledgermap_core::Account;
use ledgermap_core::session::UploadedLedger;
use minijinja::{Environment, context};
use once_cell::sync::Lazy;

use crate::advisor::{MappingPattern, ReferenceChart};
use crate::error::MappingError;

/// How many established mapping patterns the advisor prompt shows.
const PATTERN_SAMPLE_LIMIT: usize = 5;

/// How many uploaded accounts the analysis prompt embeds as JSON.
const ACCOUNT_SAMPLE_LIMIT: usize = 10;

const MAP_ACCOUNT_TEMPLATE: &str = r#"As an expert accountant, map this source account to the most appropriate target account.

Source Account: {{ source.code }} - {{ source.description }}
Account Type: {{ source.account_type or "Unknown" }}
Category: {{ source.category or "Unknown" }}

Available Target Accounts:
{% for target in targets -%}
{{ target.code }}: {{ target.description }} ({{ target.account_type or "Unknown" }})
{% endfor -%}
{% if context %}
Additional Context: {{ context }}
{% endif %}
Please provide your response in this exact format:
MAPPING: [target_account_code]
CONFIDENCE: [0-100]
REASONING: [brief explanation of why this mapping is appropriate]
ALTERNATIVES: [comma-separated list of alternative account codes, or "None"]

Consider account functionality, business purpose, and financial statement classification."#;

const ANALYSIS_TEMPLATE: &str = r#"Based on the uploaded file '{{ ledger.filename }}' with {{ ledger.account_count }} accounts, please analyze the data and respond to: {{ query }}

ACCOUNT DATA STRUCTURE:
Columns: {{ ledger.columns | join(", ") }}

SAMPLE ACCOUNTS (first 10):
{{ sample_json }}

Please provide a comprehensive analysis including:
1. Data quality assessment
2. Account categorization insights
3. Potential mapping challenges
4. Specific recommendations based on the user's query

If the user is asking for mappings, provide detailed mapping suggestions with confidence levels."#;

const ADVISOR_SYSTEM_TEMPLATE: &str = r#"You are an AI assistant specialized in accounting cross-reference mapping between a source ledger and a target chart of accounts.

MAPPING CONTEXT:
You are specifically helping map accounts FROM the uploaded source ledger TO the target chart of accounts.

KEY CAPABILITIES:
- Analyze source accounts and suggest appropriate target mappings
- Provide confidence scores (85-98% for direct matches, 70-84% for semantic matches)
- Explain mapping logic based on account functions and industry standards
- Follow established mapping patterns from historical data
- Handle bulk operations and data validation

MAPPING GUIDELINES:
1. DIRECT MATCHES (95-98% confidence): Exact functional equivalents
2. SEMANTIC MATCHES (85-94% confidence): Similar function, different naming
3. CONSOLIDATED MATCHES (70-84% confidence): Multiple source accounts to one target

RESPONSE FORMAT for mapping requests:
Always provide mappings in this exact format:
1. [SOURCE_CODE] -> [TARGET_CODE] (confidence%)
   Reasoning: [detailed explanation]

Be conversational but professional, and always prioritize accuracy in accounting mappings.
{%- if chart %}

TARGET ACCOUNT STRUCTURE:
Total Available Accounts: {{ chart.total_accounts }}

Account Classes Available:
{% for class_name, class_data in chart.account_classes | items -%}
{{ class_name }} Accounts:
{% for sub_name, accounts in class_data.sub_classes | items -%}
  - {{ sub_name }}: {{ accounts | length }} accounts
{% for account in accounts %}{% if loop.index0 < 2 %}    - {{ account.account_code }}: {{ account.description }}
{% endif %}{% endfor -%}
{% endfor -%}
{% endfor -%}
{% endif %}
{%- if patterns %}

ESTABLISHED MAPPING PATTERNS (use as reference):
{% for pattern in patterns -%}
{{ pattern.source_code }} -> {{ pattern.target_code }} ({{ pattern.confidence }}%)
  Source: {{ pattern.source_description }}
  Target: {{ pattern.target_description }}
  Type: {{ pattern.mapping_type }} - {{ pattern.notes }}
{% endfor -%}
{% endif %}
{%- if ledger %}

UPLOADED SOURCE FILE CONTEXT:
- Filename: {{ ledger.filename }}
- Total accounts: {{ ledger.account_count }}
- Columns: {{ ledger.columns | join(", ") }}
- Upload time: {{ ledger.upload_time }}
- Sample data: {{ sample_json }}

You have full access to both the uploaded source accounts AND the complete target account structure. You can:
1. Analyze source accounts and suggest specific target mappings
2. Provide exact target account codes and descriptions
3. Use established mapping patterns as reference
4. Explain confidence levels based on account function similarity

When providing mappings, always reference specific target account codes from the structure above.
{% endif %}
{%- if mapping_context %}

Current mapping context: {{ mapping_context }}
{% endif %}"#;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("map_account", MAP_ACCOUNT_TEMPLATE)
        .expect("map_account template parses");
    env.add_template("ledger_analysis", ANALYSIS_TEMPLATE)
        .expect("ledger_analysis template parses");
    env.add_template("advisor_system", ADVISOR_SYSTEM_TEMPLATE)
        .expect("advisor_system template parses");
    env
});

/// Renders the per-account mapping prompt: the source account, every
/// candidate target, the optional caller context, and the four-line format
/// request.
pub fn render_mapping_prompt(
    source: &Account,
    targets: &[Account],
    context: Option<&str>,
) -> Result<String, MappingError> {
    render("map_account", context! { source, targets, context })
}

/// Renders the ledger-analysis prompt over an uploaded ledger.
pub fn render_analysis_prompt(ledger: &UploadedLedger, query: &str) -> Result<String, MappingError> {
    let sample = &ledger.accounts[..ledger.accounts.len().min(ACCOUNT_SAMPLE_LIMIT)];
    let sample_json = to_pretty_json(&sample)?;
    render("ledger_analysis", context! { ledger, query, sample_json })
}

/// Renders the advisor system prompt with whatever reference material is
/// available: target chart summary, established patterns, the session's
/// uploaded ledger, and the caller's current mapping context.
pub fn render_advisor_system(
    chart: Option<&ReferenceChart>,
    patterns: &[MappingPattern],
    ledger: Option<&UploadedLedger>,
    mapping_context: Option<&serde_json::Value>,
) -> Result<String, MappingError> {
    let patterns: Vec<&MappingPattern> = patterns.iter().take(PATTERN_SAMPLE_LIMIT).collect();
    let sample_json = match ledger {
        Some(ledger) => Some(to_pretty_json(&ledger.raw_data_sample)?),
        None => None,
    };
    let mapping_context = match mapping_context {
        Some(value) => Some(to_pretty_json(value)?),
        None => None,
    };

    render(
        "advisor_system",
        context! { chart, patterns, ledger, sample_json, mapping_context },
    )
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String, MappingError> {
    let template = TEMPLATES
        .get_template(name)
        .map_err(|err| MappingError::Prompt(err.to_string()))?;
    template
        .render(ctx)
        .map_err(|err| MappingError::Prompt(err.to_string()))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, MappingError> {
    serde_json::to_string_pretty(value).map_err(|err| MappingError::Prompt(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{AccountClass, ReferenceAccount};
    use std::collections::BTreeMap;

    fn targets() -> Vec<Account> {
        vec![
            Account::new("101000", "Cash - Operating Account").with_account_type("Asset"),
            Account::new("103000", "Accounts Receivable - Trade"),
        ]
    }

    #[test]
    fn mapping_prompt_lists_every_target_and_the_format_block() {
        let source = Account::new("1010", "Operating Cash")
            .with_account_type("Asset")
            .with_category("Cash");

        let prompt = render_mapping_prompt(&source, &targets(), None).unwrap();

        assert!(prompt.contains("Source Account: 1010 - Operating Cash"));
        assert!(prompt.contains("Account Type: Asset"));
        assert!(prompt.contains("101000: Cash - Operating Account (Asset)"));
        // Missing target type falls back to Unknown.
        assert!(prompt.contains("103000: Accounts Receivable - Trade (Unknown)"));
        assert!(prompt.contains("MAPPING: [target_account_code]"));
        assert!(prompt.contains("CONFIDENCE: [0-100]"));
        assert!(prompt.contains("ALTERNATIVES: [comma-separated list of alternative account codes, or \"None\"]"));
        assert!(!prompt.contains("Additional Context:"));
    }

    #[test]
    fn mapping_prompt_includes_context_when_given() {
        let source = Account::new("1010", "Operating Cash");
        let prompt =
            render_mapping_prompt(&source, &targets(), Some("Migration from legacy GL")).unwrap();

        assert!(prompt.contains("Additional Context: Migration from legacy GL"));
    }

    #[test]
    fn source_without_type_or_category_shows_unknown() {
        let source = Account::new("9999", "Misc");
        let prompt = render_mapping_prompt(&source, &targets(), None).unwrap();

        assert!(prompt.contains("Account Type: Unknown"));
        assert!(prompt.contains("Category: Unknown"));
    }

    #[test]
    fn analysis_prompt_embeds_ledger_shape_and_query() {
        let ledger = UploadedLedger::new(
            "trial_balance.csv",
            vec![Account::new("1000", "Cash"), Account::new("2000", "AP")],
            vec!["Account_Code".to_string(), "Account_Description".to_string()],
            Vec::new(),
        );

        let prompt = render_analysis_prompt(&ledger, "what maps to cash?").unwrap();

        assert!(prompt.contains("uploaded file 'trial_balance.csv' with 2 accounts"));
        assert!(prompt.contains("respond to: what maps to cash?"));
        assert!(prompt.contains("Columns: Account_Code, Account_Description"));
        assert!(prompt.contains("\"code\": \"1000\""));
        assert!(prompt.contains("1. Data quality assessment"));
    }

    #[test]
    fn advisor_system_is_minimal_without_reference_material() {
        let system = render_advisor_system(None, &[], None, None).unwrap();

        assert!(system.contains("accounting cross-reference mapping"));
        assert!(!system.contains("TARGET ACCOUNT STRUCTURE"));
        assert!(!system.contains("ESTABLISHED MAPPING PATTERNS"));
        assert!(!system.contains("UPLOADED SOURCE FILE CONTEXT"));
    }

    #[test]
    fn advisor_system_embeds_chart_patterns_and_ledger() {
        let mut sub_classes = BTreeMap::new();
        sub_classes.insert(
            "Cash".to_string(),
            vec![
                ReferenceAccount {
                    account_code: "101000".to_string(),
                    description: "Cash - Operating Account".to_string(),
                },
                ReferenceAccount {
                    account_code: "101100".to_string(),
                    description: "Cash - Payroll Account".to_string(),
                },
                ReferenceAccount {
                    account_code: "101200".to_string(),
                    description: "Cash - Reserve Account".to_string(),
                },
            ],
        );
        let mut account_classes = BTreeMap::new();
        account_classes.insert("Asset".to_string(), AccountClass { sub_classes });
        let chart = ReferenceChart {
            total_accounts: 3,
            account_classes,
        };

        let patterns = vec![MappingPattern {
            source_code: "1010".to_string(),
            target_code: "101000".to_string(),
            confidence: 95,
            source_description: "Operating Cash".to_string(),
            target_description: "Cash - Operating Account".to_string(),
            mapping_type: "Direct".to_string(),
            notes: "exact functional match".to_string(),
        }];

        let ledger = UploadedLedger::new(
            "gl_export.csv",
            vec![Account::new("1010", "Operating Cash")],
            vec!["GL_Account".to_string()],
            Vec::new(),
        );

        let system =
            render_advisor_system(Some(&chart), &patterns, Some(&ledger), None).unwrap();

        assert!(system.contains("Total Available Accounts: 3"));
        assert!(system.contains("Asset Accounts:"));
        assert!(system.contains("- Cash: 3 accounts"));
        assert!(system.contains("101000: Cash - Operating Account"));
        // Only the first two reference accounts appear as samples.
        assert!(!system.contains("101200"));
        assert!(system.contains("1010 -> 101000 (95%)"));
        assert!(system.contains("Type: Direct - exact functional match"));
        assert!(system.contains("- Filename: gl_export.csv"));
    }

    #[test]
    fn advisor_system_shows_at_most_five_patterns() {
        let patterns: Vec<MappingPattern> = (0..8)
            .map(|i| MappingPattern {
                source_code: format!("10{i}0"),
                target_code: format!("10{i}000"),
                confidence: 90,
                source_description: format!("Source {i}"),
                target_description: format!("Target {i}"),
                mapping_type: "Direct".to_string(),
                notes: String::new(),
            })
            .collect();

        let system = render_advisor_system(None, &patterns, None, None).unwrap();

        assert!(system.contains("1040 -> 104000"));
        assert!(!system.contains("1050 -> 105000"));
    }

    #[test]
    fn advisor_system_appends_mapping_context_json() {
        let context = serde_json::json!({"target_system": "Eagle"});
        let system = render_advisor_system(None, &[], None, Some(&context)).unwrap();

        assert!(system.contains("Current mapping context:"));
        assert!(system.contains("\"target_system\": \"Eagle\""));
    }
}
