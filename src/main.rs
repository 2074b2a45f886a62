fn main() -> anyhow::Result<()> {
    env_logger::init();
    cityscape::default().run()
}
