//! Counts, statistics and exports.

use super::{Args, Operation, Param, ParamKind, Plan, Registry, ResultShape};
use crate::{bridge::ScriptInvocation, error::Result};

const STATISTICS_SCOPES: &[&str] = &["account_overview", "sender_stats", "mailbox_breakdown"];
const EXPORT_SCOPES: &[&str] = &["single_email", "entire_mailbox"];
const EXPORT_FORMATS: &[&str] = &["txt", "html"];

const UNREAD_COUNT_SCRIPT: &str = r#"
tell application "Mail"
    set resultList to {}
    repeat with anAccount in every account
        set accountName to name of anAccount
        try
            try
                set inboxMailbox to mailbox "INBOX" of anAccount
            on error
                set inboxMailbox to mailbox "Inbox" of anAccount
            end try
            set end of resultList to accountName & ":" & (unread count of inboxMailbox)
        on error
            set end of resultList to accountName & ":ERROR"
        end try
    end repeat
    set AppleScript's text item delimiters to "|"
    return resultList as string
end tell
"#;

const GET_STATISTICS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::optional("scope", ParamKind::String, "\"account_overview\" (default), \"sender_stats\" or \"mailbox_breakdown\""),
    Param::optional("sender", ParamKind::String, "Sender to analyze; required for sender_stats"),
    Param::optional("mailbox", ParamKind::String, "Mailbox for mailbox_breakdown (default: INBOX)"),
    Param::optional("days_back", ParamKind::Integer, "Days of history to count (default: 30, 0 = all)"),
];

const EXPORT_EMAILS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("scope", ParamKind::String, "\"single_email\" or \"entire_mailbox\""),
    Param::optional("subject_keyword", ParamKind::String, "Email to export; required for single_email"),
    Param::optional("mailbox", ParamKind::String, "Mailbox to export from (default: INBOX)"),
    Param::optional("save_directory", ParamKind::String, "Directory for the export file (default: ~/Desktop)"),
    Param::optional("format", ParamKind::String, "\"txt\" (default) or \"html\""),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "get_unread_count",
        category: "analytics",
        description: "Get the count of unread emails in each account's inbox. \
            Accounts whose inbox cannot be read report -1.",
        params: &[],
        plan: plan_unread_count,
    });
    registry.register(Operation {
        name: "get_statistics",
        category: "analytics",
        description: "Email statistics for an account: an overview with top senders, \
            one sender's activity, or a single mailbox's read/unread breakdown.",
        params: GET_STATISTICS_PARAMS,
        plan: plan_statistics,
    });
    registry.register(Operation {
        name: "export_emails",
        category: "analytics",
        description: "Export one email or a whole mailbox to a text or HTML file.",
        params: EXPORT_EMAILS_PARAMS,
        plan: plan_export,
    });
}

fn plan_unread_count(_: &Args) -> Result<Plan> {
    Ok(Plan {
        invocation: ScriptInvocation::inline(UNREAD_COUNT_SCRIPT),
        shape: ResultShape::Counts,
    })
}

fn plan_statistics(args: &Args) -> Result<Plan> {
    let scope = args.choice("scope", STATISTICS_SCOPES, Some("account_overview"))?;
    let sender = match scope.as_str() {
        "sender_stats" => Some(args.required_str("sender")?),
        _ => args.opt_str("sender")?,
    };
    Ok(Plan::text(ScriptInvocation::file(
        "analytics/get_statistics.applescript",
        vec![
            args.required_str("account")?.into(),
            scope.into(),
            sender.into(),
            args.str_or("mailbox", "INBOX")?.into(),
            args.int_or("days_back", 30)?.max(0).into(),
        ],
    )))
}

fn plan_export(args: &Args) -> Result<Plan> {
    let account = args.required_str("account")?;
    let scope = args.choice("scope", EXPORT_SCOPES, None)?;
    let subject = match scope.as_str() {
        "single_email" => Some(args.required_str("subject_keyword")?),
        _ => None,
    };
    Ok(Plan::text(ScriptInvocation::file(
        "analytics/export_emails.applescript",
        vec![
            account.into(),
            scope.into(),
            subject.into(),
            args.str_or("mailbox", "INBOX")?.into(),
            args.path_or("save_directory", "~/Desktop")?.into(),
            args.choice("format", EXPORT_FORMATS, Some("txt"))?.into(),
        ],
    )))
}
