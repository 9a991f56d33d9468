//! Optional helpers registered on the handlebars engine.

use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, HelperResult, JsonTruthy, Output,
    RenderContext, Renderable, StringOutput,
};
use serde_json::Value;

/// Loose truthiness: strings such as `yes`, `On` and `1` count as true.
pub(crate) fn to_bool(value: &Value) -> bool {
    match value {
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        other => other.is_truthy(false),
    }
}

handlebars_helper!(bool_helper: |value: Json| to_bool(value));
handlebars_helper!(yes_no_helper: |value: Json| if to_bool(value) { "yes" } else { "no" });
handlebars_helper!(on_off_helper: |value: Json| if to_bool(value) { "on" } else { "off" });
handlebars_helper!(from_json_helper: |text: str| {
    serde_json::from_str::<Value>(text).unwrap_or(Value::Null)
});
handlebars_helper!(take_helper: |items: array, count: u64| {
    items.iter().take(count as usize).cloned().collect::<Vec<Value>>()
});
handlebars_helper!(skip_helper: |items: array, count: u64| {
    items.iter().skip(count as usize).cloned().collect::<Vec<Value>>()
});

/// `{{#do}}...{{/do}}` renders its block for side effects only.
pub(crate) struct DoBlock;

impl HelperDef for DoBlock {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        _out: &mut dyn Output,
    ) -> HelperResult {
        if let Some(template) = h.template() {
            let mut discarded = StringOutput::new();
            template.render(r, ctx, rc, &mut discarded)?;
        }
        Ok(())
    }
}

fn print_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    _: &mut dyn Output,
) -> HelperResult {
    let message = h
        .params()
        .iter()
        .map(|param| match param.value() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    log::info!("{}", message);
    Ok(())
}

pub(crate) fn register_bool(registry: &mut Handlebars<'static>) {
    registry.register_helper("bool", Box::new(bool_helper));
}

pub(crate) fn register_yes_no(registry: &mut Handlebars<'static>) {
    registry.register_helper("yesno", Box::new(yes_no_helper));
}

pub(crate) fn register_on_off(registry: &mut Handlebars<'static>) {
    registry.register_helper("onoff", Box::new(on_off_helper));
}

pub(crate) fn register_from_json(registry: &mut Handlebars<'static>) {
    registry.register_helper("fromjson", Box::new(from_json_helper));
}

pub(crate) fn register_loop_controls(registry: &mut Handlebars<'static>) {
    registry.register_helper("take", Box::new(take_helper));
    registry.register_helper("skip", Box::new(skip_helper));
}

pub(crate) fn register_do(registry: &mut Handlebars<'static>) {
    registry.register_helper("do", Box::new(DoBlock));
}

pub(crate) fn register_print(registry: &mut Handlebars<'static>) {
    registry.register_helper("print", Box::new(print_helper));
}
