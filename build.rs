fn main() {
    #[cfg(feature = "grpc")]
    {
        tonic_build::configure()
            .build_server(true)
            .build_client(true)
            .emit_rerun_if_changed(false)
            .compile_protos(&["proto/zkp_auth.proto"], &["proto"])
            .unwrap_or_else(|e| panic!("Failed to compile protos: {e}"));
        println!("cargo:rerun-if-changed=proto/zkp_auth.proto");
    }
}
