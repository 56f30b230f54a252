fn main() -> anyhow::Result<()> {
    ldap_predicate::run()
}
