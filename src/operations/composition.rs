use super::{Args, Operation, Param, ParamKind, Plan, Registry};
use crate::{bridge::ScriptInvocation, error::Result};

const COMPOSE_EMAIL_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account to send from"),
    Param::required("to", ParamKind::String, "Recipients, comma-separated"),
    Param::required("subject", ParamKind::String, "Subject line"),
    Param::required("body", ParamKind::String, "Body text"),
    Param::optional("cc", ParamKind::String, "CC recipients, comma-separated"),
    Param::optional("bcc", ParamKind::String, "BCC recipients, comma-separated"),
];

const REPLY_TO_EMAIL_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account holding the email"),
    Param::required("subject_keyword", ParamKind::String, "Keyword to find the email to reply to"),
    Param::required("reply_body", ParamKind::String, "Reply text"),
    Param::optional("reply_to_all", ParamKind::Boolean, "Reply to every recipient (default: false)"),
];

const FORWARD_EMAIL_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account holding the email"),
    Param::required("subject_keyword", ParamKind::String, "Keyword to find the email to forward"),
    Param::required("to", ParamKind::String, "Recipients, comma-separated"),
    Param::optional("message", ParamKind::String, "Text to put above the forwarded email"),
    Param::optional("mailbox", ParamKind::String, "Mailbox to search (default: INBOX)"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "compose_email",
        category: "composition",
        description: "Compose and send a new email from an account.",
        params: COMPOSE_EMAIL_PARAMS,
        plan: plan_compose,
    });
    registry.register(Operation {
        name: "reply_to_email",
        category: "composition",
        description: "Reply to the first inbox email whose subject contains a keyword.",
        params: REPLY_TO_EMAIL_PARAMS,
        plan: plan_reply,
    });
    registry.register(Operation {
        name: "forward_email",
        category: "composition",
        description: "Forward the first email whose subject contains a keyword, \
            optionally with a message above it.",
        params: FORWARD_EMAIL_PARAMS,
        plan: plan_forward,
    });
}

fn plan_compose(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "composition/compose_email.applescript",
        vec![
            args.required_str("account")?.into(),
            args.required_str("to")?.into(),
            args.required_str("subject")?.into(),
            args.required_str("body")?.into(),
            args.opt_str("cc")?.into(),
            args.opt_str("bcc")?.into(),
        ],
    )))
}

fn plan_reply(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "composition/reply_to_email.applescript",
        vec![
            args.required_str("account")?.into(),
            args.required_str("subject_keyword")?.into(),
            args.required_str("reply_body")?.into(),
            args.bool_or("reply_to_all", false)?.into(),
        ],
    )))
}

fn plan_forward(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "composition/forward_email.applescript",
        vec![
            args.required_str("account")?.into(),
            args.required_str("subject_keyword")?.into(),
            args.required_str("to")?.into(),
            args.opt_str("message")?.into(),
            args.str_or("mailbox", "INBOX")?.into(),
        ],
    )))
}
