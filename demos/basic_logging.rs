use ctxlog::{Logger, LoggerDef, LoggerOptions};

fn main() -> ctxlog::Result<()> {
    let log = Logger::new();
    log.write("plain line on stdout")?;

    log.register_many([
        ("err", LoggerDef::from("stderr")),
        (
            "audit",
            LoggerDef::from(
                LoggerOptions::new()
                    .with_destination("/tmp/ctxlog_demo_audit.log")
                    .with_prompt("Audit")
                    .with_date_template("YE-MO-DA HO:MI:SE.ML")
                    .with_flags("a"),
            ),
        ),
    ])?;

    log.get("err").unwrap().write("a line on stderr")?;
    log.get("audit").unwrap().write("appended with a timestamp")?;

    // updating an alias merges fields, the prompt survives
    log.register("audit", LoggerOptions::new().with_compact(false))?;
    log.get("audit").unwrap().write("still prompted")?;

    println!("audit lines written to /tmp/ctxlog_demo_audit.log");
    Ok(())
}
