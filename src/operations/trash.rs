use super::{Args, Operation, Param, ParamKind, Plan, Registry};
use crate::{bridge::ScriptInvocation, error::Result};

const TRASH_ACTIONS: &[&str] = &["move_to_trash", "delete_permanent", "empty_trash"];

const MANAGE_TRASH_PARAMS: &[Param] = &[
    Param::required("account", ParamKind::String, "Account name"),
    Param::required("action", ParamKind::String, "One of: move_to_trash, delete_permanent, empty_trash"),
    Param::optional("subject_keyword", ParamKind::String, "Only emails whose subject contains this"),
    Param::optional("sender", ParamKind::String, "Only emails whose sender contains this"),
    Param::optional("mailbox", ParamKind::String, "Source mailbox for move_to_trash (default: INBOX)"),
    Param::optional("max_deletes", ParamKind::Integer, "Maximum number of emails affected (default: 5)"),
];

pub fn register(registry: &mut Registry) {
    registry.register(Operation {
        name: "manage_trash",
        category: "trash",
        description: "Move matching emails to the trash, permanently delete matching \
            emails from the trash, or empty the trash.",
        params: MANAGE_TRASH_PARAMS,
        plan: plan_trash,
    });
}

fn plan_trash(args: &Args) -> Result<Plan> {
    Ok(Plan::text(ScriptInvocation::file(
        "trash/manage_trash.applescript",
        vec![
            args.required_str("account")?.into(),
            args.choice("action", TRASH_ACTIONS, None)?.into(),
            args.opt_str("subject_keyword")?.into(),
            args.opt_str("sender")?.into(),
            args.str_or("mailbox", "INBOX")?.into(),
            args.int_or("max_deletes", 5)?.into(),
        ],
    )))
}
