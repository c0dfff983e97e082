//! Financial documents: statements, invoices, tax returns, payroll, reports

use once_cell::sync::Lazy;

use super::{any_match, compile, header_overlap, KeywordCatalog, PatternGroup, RuleContext};

pub const DOCUMENT_TYPES: &[&str] = &[
    "bank_statement",
    "credit_card_statement",
    "invoice",
    "tax_return",
    "payroll",
    "loan_application",
    "financial_report",
];

pub const KEYWORDS: KeywordCatalog = &[
    (
        "bank_statement",
        &[
            "account balance",
            "transaction history",
            "deposit",
            "withdrawal",
            "account number",
            "statement period",
            "opening balance",
            "closing balance",
        ],
    ),
    (
        "credit_card_statement",
        &[
            "credit limit",
            "minimum payment",
            "statement balance",
            "apr",
            "credit card",
            "card number",
            "payment due date",
            "interest charges",
        ],
    ),
    (
        "invoice",
        &[
            "invoice number",
            "bill to",
            "payment terms",
            "due date",
            "subtotal",
            "total amount",
            "tax",
            "invoice date",
        ],
    ),
    (
        "tax_return",
        &[
            "tax year",
            "taxable income",
            "deductions",
            "tax paid",
            "tax return",
            "social security",
            "filing status",
            "irs",
        ],
    ),
    (
        "payroll",
        &[
            "salary",
            "wages",
            "deductions",
            "net pay",
            "gross pay",
            "pay period",
            "employee id",
            "payroll date",
        ],
    ),
    (
        "loan_application",
        &[
            "loan amount",
            "interest rate",
            "term",
            "collateral",
            "borrower",
            "credit score",
            "monthly payment",
            "application date",
        ],
    ),
    (
        "financial_report",
        &[
            "balance sheet",
            "income statement",
            "cash flow",
            "assets",
            "liabilities",
            "equity",
            "profit",
            "loss",
        ],
    ),
];

static ACCOUNT_NUMBER: PatternGroup = Lazy::new(|| {
    compile(&[
        r"\b\d{10,12}\b",
        r"\b\d{4}[\s-]\d{4}[\s-]\d{4}\b",
        r"account\s*#?\s*:\s*\d+",
    ])
});

static CREDIT_CARD: PatternGroup = Lazy::new(|| {
    compile(&[
        r"\b(?:\d{4}[\s-]){3}\d{4}\b",
        r"credit\s+card",
        r"card\s+member",
        r"minimum\s+payment",
        r"apr",
    ])
});

static BANK: PatternGroup = Lazy::new(|| {
    compile(&[
        r"\b(opening|closing)\s+balance",
        r"\b(deposit|withdrawal)",
        r"transaction\s+history",
        r"statement\s+period",
        r"available\s+balance",
    ])
});

static INVOICE: PatternGroup = Lazy::new(|| {
    compile(&[
        r"invoice\s+number",
        r"bill\s+to",
        r"payment\s+terms",
        r"due\s+date",
        r"total\s+amount",
    ])
});

static TAX: PatternGroup = Lazy::new(|| {
    compile(&[
        r"form\s+1040",
        r"tax\s+return",
        r"taxable\s+income",
        r"irs",
        r"tax\s+year",
    ])
});

const STATEMENT_HEADERS: &[&str] = &[
    "assets",
    "liabilities",
    "equity",
    "revenue",
    "expenses",
    "income",
    "balance",
    "cash flow",
    "profit",
    "loss",
];

const PAYROLL_HEADERS: &[&str] = &[
    "salary",
    "wages",
    "deductions",
    "net pay",
    "gross pay",
    "employee",
    "hours",
    "overtime",
    "taxes",
];

/// Rules in priority order; the first that fires decides the type
pub fn custom_rules(text: &str, context: &RuleContext<'_>) -> Result<Option<&'static str>, String> {
    if any_match(&ACCOUNT_NUMBER, "account number", text)? {
        if any_match(&CREDIT_CARD, "credit card", text)? {
            return Ok(Some("credit_card_statement"));
        }
        if any_match(&BANK, "bank", text)? {
            return Ok(Some("bank_statement"));
        }
    }

    if any_match(&INVOICE, "invoice", text)? {
        return Ok(Some("invoice"));
    }

    if any_match(&TAX, "tax", text)? {
        return Ok(Some("tax_return"));
    }

    if header_overlap(context.tables, STATEMENT_HEADERS, 2) {
        return Ok(Some("financial_report"));
    }
    if header_overlap(context.tables, PAYROLL_HEADERS, 3) {
        return Ok(Some("payroll"));
    }

    Ok(None)
}
