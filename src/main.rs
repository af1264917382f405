fn main() -> std::process::ExitCode {
    verlo_admin_lib::run()
}
