use super::{Args, Operation, Param, ParamKind, Plan, Registry};
use crate::{
    bridge::ScriptInvocation,
    error::{BridgeError, Result},
};

const DRAFT_ACTIONS: &[&str] = &["list", "create", "send", "delete"];

const MANAGE_DRAFTS_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("action", ParamKind::String, "One of: list, create, send, delete"),
    Param::optional("subject", ParamKind::String, "Subject (required for create)"),
    Param::optional("to", ParamKind::String, "Recipients, comma-separated (required for create)"),
    Param::optional("body", ParamKind::String, "Body text (required for create)"),
    Param::optional("cc", ParamKind::String, "CC recipients, comma-separated"),
    Param::optional("bcc", ParamKind::String, "BCC recipients, comma-separated"),
    Param::optional("draft_subject", ParamKind::String, "Subject keyword of the draft (required for send/delete)"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "manage_drafts",
        category: "drafts",
        description: "List, create, send or delete draft emails.",
        params: MANAGE_DRAFTS_PARAMS,
        plan: plan_drafts,
    });
}

fn plan_drafts(args: &Args) -> Result<Plan> {
    let action = args.choice("action", DRAFT_ACTIONS, None)?;
    let subject = args.opt_str("subject")?;
    let to = args.opt_str("to")?;
    let body = args.opt_str("body")?;
    let draft_subject = args.opt_str("draft_subject")?;

    match action.as_str() {
        "create" if subject.is_none() || to.is_none() || body.is_none() => {
            return Err(BridgeError::InvalidArgument(
                "'subject', 'to', and 'body' are required for creating drafts".to_string(),
            ));
        }
        "send" | "delete" if draft_subject.is_none() => {
            return Err(BridgeError::InvalidArgument(format!(
                "'draft_subject' is required for action '{action}'"
            )));
        }
        _ => {}
    }

    Ok(Plan::text(ScriptInvocation::file(
        "drafts/manage_drafts.applescript",
        vec![
            args.required_str("account")?.into(),
            action.into(),
            subject.into(),
            to.into(),
            body.into(),
            args.opt_str("cc")?.into(),
            args.opt_str("bcc")?.into(),
            draft_subject.into(),
        ],
    )))
}
