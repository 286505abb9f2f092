//! Domain agents
//!
//! Six business areas share one agent shape; a profile supplies the domain
//! summary, the allowed remote operations, and whether the FAQ retrieval
//! tool is bound.

use crate::models::AgentKind;

pub mod domain;
pub mod supervisor;

pub use domain::{AgentStepOutcome, DomainAgent};
pub use supervisor::Supervisor;

pub struct DomainProfile {
    pub kind: AgentKind,
    /// One-line role statement injected into the system prompt.
    pub summary: &'static str,
    /// Supervisor-facing routing-tool description.
    pub routing_description: &'static str,
    /// Allowed remote operations, described for the model.
    pub api_surface: &'static str,
    /// The information agent additionally binds the FAQ retrieval tool.
    pub has_faq_tool: bool,
}

static PROFILES: [DomainProfile; 6] = [
    DomainProfile {
        kind: AgentKind::Reports,
        summary: "You specialize in financial and investment reports: ledger reports, \
                  profit-and-loss statements, contract notes, brokerage reports, and \
                  tax documents.",
        routing_description: "Route here when the user requests financial or investment \
                              reports or statements for review or download: P&L statements, \
                              ledger reports, contract notes, sauda details, brokerage \
                              reports, ITR/STT/TDS tax documents, or RTA statements.",
        api_surface: "\
- ledger_statement: ledger report for a date range
- profit_loss_statement: realized/unrealized P&L for a date range
- contract_note: contract note for a settlement date
- sauda_details: trade (sauda) details for a date range
- brokerage_report: brokerage summary for a date range
- itr_statement: income-tax return statement for a financial year
- stt_certificate: securities transaction tax certificate for a financial year",
        has_faq_tool: false,
    },
    DomainProfile {
        kind: AgentKind::Account,
        summary: "You specialize in account information and settings: profile details, \
                  account status, modification tracking, and dormant-account \
                  reactivation.",
        routing_description: "Route here when the user wants to view or manage account \
                              information: profile details, account status, modification \
                              status or forms, branch information, dormant reactivation, \
                              or updates to email, phone, address, bank, or nominee.",
        api_surface: "\
- client_profile: view client profile and dashboard details
- account_status: current account status
- modification_status: track a pending account-modification request
- branch_details: branch contact information
- dormant_reactivation: dormant account reactivation request
- modification_forms: account opening/modification forms by persona",
        has_faq_tool: false,
    },
    DomainProfile {
        kind: AgentKind::Funds,
        summary: "You specialize in funds, margin, and payment status: payouts, fund \
                  transfers, margin availability and penalties, and mutual-fund orders.",
        routing_description: "Route here when the user asks about funds, margin, or \
                              payment-related status: payout or fund-transfer tracking, \
                              available margin, margin shortage penalties, or mutual-fund \
                              order and SIP status.",
        api_surface: "\
- fund_payout_status: payout request status
- fund_transfer_status: incoming fund-transfer status
- available_margin: current available margin
- margin_shortage_penalty: margin shortage penalty report
- mf_order_status: mutual-fund order / SIP status",
        has_faq_tool: false,
    },
    DomainProfile {
        kind: AgentKind::Trading,
        summary: "You specialize in online trading access: activating and deactivating \
                  trading services on the account.",
        routing_description: "Route here when the user asks to start or stop online \
                              trading access, or requests trading activation or \
                              deactivation.",
        api_surface: "\
- trading_activation: enable online trading for the account
- trading_deactivation: disable online trading for the account
- trading_status: current trading-access status",
        has_faq_tool: false,
    },
    DomainProfile {
        kind: AgentKind::Information,
        summary: "You specialize in market information, corporate actions, and general \
                  assistance, answering strictly from the FAQ knowledge base.",
        routing_description: "Route here for informational queries not tied to personal \
                              data: corporate actions (IPOs, buybacks, dividends), market \
                              research, platform features, policies, and how-to questions.",
        api_surface: "\
- research_reports: latest market research publications
- corporate_actions: upcoming IPOs, buybacks, and dividends",
        has_faq_tool: true,
    },
    DomainProfile {
        kind: AgentKind::Depository,
        summary: "You specialize in depository-participant services: DP statements, \
                  demat holdings, and depository identifiers.",
        routing_description: "Route here for DP-related items: DP transaction statements, \
                              total holdings in the demat account, the depository \
                              participant id, or DIS/DRF status. Key signal: the user \
                              mentions DP or demat.",
        api_surface: "\
- dp_statement: DP transaction statement for a date range
- demat_holdings: current holdings in the demat account
- dp_identifier: the account's depository participant id
- dis_drf_status: DIS/DRF request status",
        has_faq_tool: false,
    },
];

pub fn profile(kind: AgentKind) -> &'static DomainProfile {
    PROFILES
        .iter()
        .find(|profile| profile.kind == kind)
        .expect("profile defined for every agent kind")
}

pub fn all_profiles() -> &'static [DomainProfile] {
    &PROFILES
}
