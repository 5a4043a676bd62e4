fn main() {
    let result = tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(&["proto/rider_auth.proto"], &["proto"]);

    if let Err(e) = result {
        // protoc is not available in every build environment; fall back to
        // the checked-in generated bindings so the crate still builds.
        println!("cargo:warning=protoc unavailable ({e}); using vendored proto/rider_auth.generated.rs");
        let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
        std::fs::copy(
            "proto/rider_auth.generated.rs",
            std::path::Path::new(&out_dir).join("rider_auth.rs"),
        )
        .unwrap_or_else(|e| panic!("failed to copy vendored rider_auth bindings: {e}"));
    }

    println!("cargo:rerun-if-changed=proto/rider_auth.proto");
    println!("cargo:rerun-if-changed=proto/rider_auth.generated.rs");
}
