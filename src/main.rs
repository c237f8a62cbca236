fn main() {
    unforget::start_cli();
}
