use log::{error, info};
use weave::{Aspect, CallError, CallResult, Function, Object, Slots, Value, arg};

const DOLLAR_TO_RUPEES_RATE: f64 = 44.3;

#[derive(Debug, Clone, Default, Slots)]
struct ProductFields {
    #[slots(rename = "_name")]
    name: String,
    #[slots(rename = "_cost")]
    cost: f64,
    #[slots(rename = "_currency")]
    currency: Option<String>,
}

fn product() -> Function {
    Function::new("Product", |this, args| {
        let fields = ProductFields {
            name: arg(args, 0)?,
            cost: arg(args, 1)?,
            currency: arg(args, 2)?,
        };
        let object = this.receiver()?;
        object.assign_slots(&fields);
        if args.get(2).is_none() {
            // 省略された通貨は null ではなく未定義のまま（view に出さない）
            object.set("_currency", Value::Undefined);
        }
        Ok(Value::Undefined)
    })
}

fn member(this: &Value, key: &str) -> CallResult {
    Ok(this.receiver()?.get(key).unwrap_or_default())
}

fn modified_product() -> Function {
    Function::class("ModifiedProduct")
        .method("getCost", |this, _| member(this, "_cost"))
        .method("getCurrency", |this, _| member(this, "_currency"))
        .method("getName", |this, _| member(this, "_name"))
        .method("view", |this, _| Ok(Value::from(this.to_json_string())))
}

fn view_counter() -> Function {
    Function::new("countViews", |this, _| {
        let object = this.receiver()?;
        let count = object.number("count").unwrap_or(0.0);
        object.set("count", count + 1.0);
        Ok(Value::Undefined)
    })
}

fn run(cli_args: &weave::CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = cli_args.aspect_options();
    let aspect = Aspect::with_options(options);

    let product = product();
    let p: Object = product.construct(&[
        Value::from("The name is Bond, James Bond."),
        Value::from(300),
    ])?;
    info!("getCost before introduction: {:?}", p.get("getCost"));

    let target = Value::Function(product);
    aspect.introduce(&target, &Value::Function(modified_product()))?;
    info!("getCost after introduction: {}", p.invoke("getCost", &[])?);

    aspect.around(
        &target,
        "getCost",
        |_, _, proceed| {
            let cost = proceed.call()?.as_number().unwrap_or(0.0);
            Ok(Value::from(cost * DOLLAR_TO_RUPEES_RATE))
        },
        None,
    )?;
    info!("getCost in rupees: {}", p.invoke("getCost", &[])?);

    aspect.before(&target, "view", view_counter(), None)?;
    info!("view: {}", p.invoke("view", &[])?);

    let mut snapshot = ProductFields::default();
    snapshot
        .load_slots(&p)
        .map_err(CallError::Slot)?;
    info!("snapshot: {:?}", snapshot);
    Ok(())
}

fn main() {
    let cli_args = weave::parse_args();
    weave::init_logger(&cli_args.log_level);

    if cli_args.show_help {
        weave::show_help();
        return;
    }

    if let Err(e) = run(&cli_args) {
        error!("demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bond() -> (Value, Object) {
        let product = product();
        let p = product
            .construct(&[Value::from("The name is Bond, James Bond."), Value::from(300)])
            .unwrap();
        let target = Value::Function(product);
        Aspect::new()
            .introduce(&target, &Value::Function(modified_product()))
            .unwrap();
        (target, p)
    }

    #[test]
    fn test_missing_currency_stays_undefined() {
        let (_, p) = bond();
        assert!(p.has("_currency"));
        assert_eq!(p.get("_currency"), Some(Value::Undefined));
        assert_eq!(p.invoke("getCurrency", &[]).unwrap(), Value::Undefined);

        let mut snapshot = ProductFields::default();
        snapshot.load_slots(&p).unwrap();
        assert_eq!(snapshot.currency, None);
        assert_eq!(snapshot.cost, 300.0);
    }

    #[test]
    fn test_view_keeps_member_order_after_counting() {
        let (target, p) = bond();
        let aspect = Aspect::new();
        aspect
            .around(
                &target,
                "getCost",
                |_, _, proceed| {
                    let cost = proceed.call()?.as_number().unwrap_or(0.0);
                    Ok(Value::from(cost * DOLLAR_TO_RUPEES_RATE))
                },
                None,
            )
            .unwrap();
        aspect.before(&target, "view", view_counter(), None).unwrap();

        assert_eq!(
            p.invoke("view", &[]).unwrap(),
            Value::from(r#"{"_name":"The name is Bond, James Bond.","_cost":300,"count":1}"#)
        );
        assert_eq!(p.invoke("getCost", &[]).unwrap(), Value::from(13290));
    }

    #[test]
    fn test_given_currency_is_shown_in_view() {
        let p = product()
            .construct(&[Value::from("Tea"), Value::from(2.5), Value::from("USD")])
            .unwrap();
        assert_eq!(
            Value::Object(p).to_json_string(),
            r#"{"_name":"Tea","_cost":2.5,"_currency":"USD"}"#
        );
    }
}
