//! Accounts, mailboxes, moving messages and status flags.

use super::{Args, Operation, Param, ParamKind, Plan, Registry, ResultShape};
use crate::{
    bridge::{marshal, ScriptArg, ScriptInvocation},
    error::Result,
};

const LIST_ACCOUNTS_SCRIPT: &str = r#"
tell application "Mail"
    set accountNames to {}
    repeat with anAccount in every account
        set end of accountNames to name of anAccount
    end repeat
    set AppleScript's text item delimiters to "|"
    return accountNames as string
end tell
"#;

const STATUS_ACTIONS: &[&str] = &["mark_read", "mark_unread", "flag", "unflag"];

const LIST_MAILBOXES_PARAMS: &[Param] = &[
    Param::optional("account", ParamKind::String, "Account name; all accounts when omitted"),
    Param::optional("include_counts", ParamKind::Boolean, "Include message counts (default: true)"),
];

const MOVE_EMAIL_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("subject_keyword", ParamKind::String, "Keyword to match in subjects"),
    Param::required("to_mailbox", ParamKind::String, "Destination mailbox; use '/' for nested mailboxes"),
    Param::optional("from_mailbox", ParamKind::String, "Source mailbox (default: INBOX)"),
    Param::optional("max_moves", ParamKind::Integer, "Maximum number of emails to move (default: 1)"),
];

const UPDATE_EMAIL_STATUS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("action", ParamKind::String, "One of: mark_read, mark_unread, flag, unflag"),
    Param::optional("subject_keyword", ParamKind::String, "Only emails whose subject contains this"),
    Param::optional("sender", ParamKind::String, "Only emails whose sender contains this"),
    Param::optional("mailbox", ParamKind::String, "Mailbox to search (default: INBOX)"),
    Param::optional("max_updates", ParamKind::Integer, "Maximum number of emails to update (default: 10)"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "list_accounts",
        category: "organization",
        description: "List all available Mail accounts.",
        params: &[],
        plan: plan_list_accounts,
    });
    registry.register(Operation {
        name: "list_mailboxes",
        category: "organization",
        description: "List mailboxes for one account or all accounts. Nested mailboxes \
            are shown with their path (e.g. \"Projects/Amplify Impact\").",
        params: LIST_MAILBOXES_PARAMS,
        plan: plan_list_mailboxes,
    });
    registry.register(Operation {
        name: "move_email",
        category: "organization",
        description: "Move emails whose subject contains a keyword to another mailbox.",
        params: MOVE_EMAIL_PARAMS,
        plan: plan_move_email,
    });
    registry.register(Operation {
        name: "update_email_status",
        category: "organization",
        description: "Mark emails read/unread or flag/unflag them.",
        params: UPDATE_EMAIL_STATUS_PARAMS,
        plan: plan_update_status,
    });
}

fn plan_list_accounts(_: &Args) -> Result<Plan> {
    Ok(Plan {
        invocation: ScriptInvocation::inline(LIST_ACCOUNTS_SCRIPT),
        shape: ResultShape::List,
    })
}

fn plan_list_mailboxes(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "organization/list_mailboxes.applescript",
        vec![
            args.opt_str("account")?.into(),
            args.bool_or("include_counts", true)?.into(),
        ],
    )))
}

fn plan_move_email(args: &Args) -> Result<Plan> {
    let to_mailbox = args.required_str("to_mailbox")?;
    Ok(Plan::text(ScriptInvocation::file(
        "organization/move_email.applescript",
        vec![
            args.required_str("account")?.into(),
            args.required_str("subject_keyword")?.into(),
            ScriptArg::Str(marshal::flatten_path(&to_mailbox)?),
            args.str_or("from_mailbox", "INBOX")?.into(),
            args.int_or("max_moves", 1)?.into(),
        ],
    )))
}

fn plan_update_status(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "organization/update_email_status.applescript",
        vec![
            args.required_str("account")?.into(),
            args.choice("action", STATUS_ACTIONS, None)?.into(),
            args.opt_str("subject_keyword")?.into(),
            args.opt_str("sender")?.into(),
            args.str_or("mailbox", "INBOX")?.into(),
            args.int_or("max_updates", 10)?.into(),
        ],
    )))
}
