// Generates the Kotlin bindings for the mobile feature.
fn main() {
    uniffi::uniffi_bindgen_main()
}
