use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let app = chinchilla::default()?;
    app.run()
}
