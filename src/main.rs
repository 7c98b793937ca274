fn main() {
    std::process::exit(thumb_snip_lib::run());
}
