fn main() {
    // ESP-IDF environment is only needed when building for the device.
    // Build scripts run on the host, so check the target OS cargo passes in.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
