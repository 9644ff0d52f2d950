/// Elements with a width measured in JVM slots (eg. local variables, where `long` and `double`
/// take two slots)
pub trait Width {
    fn width(&self) -> usize;
}
