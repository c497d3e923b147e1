use ctxlog::{Logger, contextualize};
use serde_json::json;

fn main() -> ctxlog::Result<()> {
    let log = Logger::new();

    let ctx = contextualize(json!({
        "name": "Pedro",
        "age": 25,
        "info": { "casa": 1, "perro": 0 },
    }));

    // placeholders resolve against the context, %d against trailing args
    log.write_ctx(
        &ctx,
        "%name% tiene %age% años, casas: %info.casa%, perros:%info.perro% y %d%€",
        &[json!(25)],
    )?;

    // expressions may combine fields
    log.write_ctx(&ctx, "dentro de un año: %age+1%", &[])?;

    // %% always renders a literal percent
    log.write_ctx(&ctx, "progreso al 100%%", &[])?;

    Ok(())
}
