fn main() {
    // Host builds have nothing to link; only flash builds need the
    // ESP-IDF environment exported by embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
