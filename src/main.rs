fn main() -> anyhow::Result<()> {
    lantern_pathtracer::run()
}
